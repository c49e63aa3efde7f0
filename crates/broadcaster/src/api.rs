use arb_types::ArbitrageRateUpdatedMessage;
use jsonrpsee::proc_macros::rpc;

/// The observer-facing surface: a single push subscription delivering
/// every `RateUpdate` the Evaluator emits, serialized per §6's wire shape.
#[rpc(server, namespace = "arb")]
pub trait RateApi {
    #[subscription(
        name = "subscribeRateUpdates",
        unsubscribe = "unsubscribeRateUpdates",
        item = ArbitrageRateUpdatedMessage
    )]
    async fn subscribe_rate_updates(&self) -> jsonrpsee::core::SubscriptionResult;
}
