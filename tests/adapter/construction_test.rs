//! Construction: validation, connection policy, and laziness.

use platform_event_stream::source::channel::ChannelSource;
use platform_event_stream::{
    AdapterState, ConnectionMode, ConnectionParams, EventStreamAdapter, SourceError, StreamError,
};
use tokio_stream::StreamExt;

use crate::support::{logged_adapter, options, password_auth, TOPIC};

#[test]
fn empty_event_name_fails_before_touching_the_source() {
    let (source, controller) = ChannelSource::new();

    let result = EventStreamAdapter::new(options(""), &source);

    assert!(matches!(result, Err(StreamError::Configuration(_))));
    assert!(controller.connection_requests().is_empty());
    assert!(controller.authentications().is_empty());
}

#[test]
fn caller_supplied_mode_is_overridden_with_single() {
    for requested in [Some(ConnectionMode::Multi), Some(ConnectionMode::Single), None] {
        let (source, controller) = ChannelSource::new();
        let connection = ConnectionParams {
            client_id: "3MVG9-client".to_owned(),
            mode: requested,
            ..ConnectionParams::default()
        };
        let options =
            platform_event_stream::AdapterOptions::new(TOPIC, connection, password_auth());

        let built = EventStreamAdapter::new(options, &source);
        assert!(built.is_ok());

        let requests = controller.connection_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].mode, Some(ConnectionMode::Single));
        assert_eq!(requests[0].client_id, "3MVG9-client");
    }
}

#[test]
fn rejected_connection_fails_construction() {
    let (source, controller) = ChannelSource::new();
    let refusal = SourceError::Rejected("unknown environment".to_owned());
    controller.reject_connections(refusal.clone());

    let result = EventStreamAdapter::new(options(TOPIC), &source);

    assert_eq!(result.err(), Some(StreamError::Connection(refusal)));
    assert!(controller.authentications().is_empty());
}

#[test]
fn construction_does_not_authenticate() {
    let (source, controller) = ChannelSource::new();
    let (adapter, logger) = logged_adapter(&source);

    assert_eq!(adapter.state(), AdapterState::Initializing);
    assert_eq!(adapter.topic(), TOPIC);
    assert!(controller.authentications().is_empty());
    assert!(controller.subscribe_requests().is_empty());
    assert!(logger.entries().is_empty());
}

#[tokio::test]
async fn first_poll_authenticates_and_subscribes_to_event_topic() {
    let (source, controller) = ChannelSource::new();
    let (mut adapter, _logger) = logged_adapter(&source);
    assert!(controller.connect());
    assert!(controller.data(serde_json::json!({ "Order_Id__c": "A-1" })));

    let first = adapter.next().await;
    assert!(matches!(first, Some(Ok(_))));

    assert_eq!(controller.authentications(), vec![password_auth()]);
    let subscribes = controller.subscribe_requests();
    assert_eq!(subscribes.len(), 1);
    assert_eq!(subscribes[0].topic, TOPIC);
    assert_eq!(
        subscribes[0].kind,
        platform_event_stream::source::SubscriptionKind::Event
    );
}

#[tokio::test]
async fn default_logger_is_silent_and_stream_still_flows() {
    let (source, controller) = ChannelSource::new();
    let mut adapter = match EventStreamAdapter::new(options(TOPIC), &source) {
        Ok(adapter) => adapter,
        Err(err) => panic!("adapter should build: {err}"),
    };
    assert!(controller.connect());
    assert!(controller.data(serde_json::json!({ "n": 1 })));
    assert!(controller.disconnect());

    let mut count = 0_usize;
    while let Some(item) = adapter.next().await {
        assert!(item.is_ok());
        count = count.saturating_add(1);
    }
    assert_eq!(count, 1);
    assert_eq!(adapter.state(), AdapterState::Ended);
}
