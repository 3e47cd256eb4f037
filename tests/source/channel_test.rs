//! Coverage for the in-process channel source.

use platform_event_stream::source::channel::ChannelSource;
use platform_event_stream::source::{
    EventSource, SourceError, SubscribeRequest, SubscriptionSignal,
};
use platform_event_stream::{AuthenticationParams, ConnectionParams};
use tokio_stream::StreamExt;

fn token_auth() -> AuthenticationParams {
    AuthenticationParams::Token {
        access_token: "00D-token".to_owned(),
        instance_url: "https://example.my.salesforce.com".to_owned(),
    }
}

#[tokio::test]
async fn subscribe_requires_authentication() {
    let (source, _controller) = ChannelSource::new();
    let connection = match source.create_connection(ConnectionParams::default()) {
        Ok(connection) => connection,
        Err(err) => panic!("connection should open: {err}"),
    };

    let result = connection
        .create_stream_client()
        .subscribe(SubscribeRequest::event("Order_Event__e"));

    assert!(matches!(result, Err(SourceError::Rejected(_))));
}

#[tokio::test]
async fn only_one_subscription_per_source() {
    let (source, controller) = ChannelSource::new();
    let mut connection = match source.create_connection(ConnectionParams::default()) {
        Ok(connection) => connection,
        Err(err) => panic!("connection should open: {err}"),
    };
    assert!(connection.authenticate(&token_auth()).await.is_ok());

    let mut client = connection.create_stream_client();
    let first = client.subscribe(SubscribeRequest::event("Order_Event__e"));
    let second = client.subscribe(SubscribeRequest::event("Order_Event__e"));

    assert!(first.is_ok());
    assert!(matches!(second, Err(SourceError::Rejected(_))));
    assert_eq!(controller.subscribe_requests().len(), 2);
}

#[tokio::test]
async fn signals_arrive_in_push_order() {
    let (source, controller) = ChannelSource::new();
    let mut connection = match source.create_connection(ConnectionParams::default()) {
        Ok(connection) => connection,
        Err(err) => panic!("connection should open: {err}"),
    };
    assert!(connection.authenticate(&token_auth()).await.is_ok());
    let mut subscription = match connection
        .create_stream_client()
        .subscribe(SubscribeRequest::event("Order_Event__e"))
    {
        Ok(subscription) => subscription,
        Err(err) => panic!("subscribe should succeed: {err}"),
    };

    assert!(controller.connect());
    assert!(controller.data(serde_json::json!({ "n": 1 })));
    assert!(controller.disconnect());
    drop(controller);

    let signals: Vec<_> = (&mut subscription).collect().await;
    assert_eq!(signals.len(), 3);
    assert_eq!(signals[0], SubscriptionSignal::Connect);
    assert!(matches!(signals[1], SubscriptionSignal::Data(_)));
    assert_eq!(signals[2], SubscriptionSignal::Disconnect);
}
