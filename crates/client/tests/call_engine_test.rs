//! Call engine scenarios over the in-memory registry and transport

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use courier_client::{Backoff, CallOptions, Client, ClientError, Request, SelectFilter, Strategy};
use courier_codec::JsonCodec;
use courier_registry::{Node, RegistryErrorKind, Service};
use courier_registry_memory::MemoryRegistry;
use courier_stream::StreamError;
use courier_transport::{Context, Message, TransportError, headers};
use courier_transport_memory::MemoryTransport;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Order {
    id: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Receipt {
    served_by: String,
}

type TestClient = Client<MemoryRegistry, MemoryTransport>;

struct Cluster {
    registry: MemoryRegistry,
    transport: MemoryTransport,
    hits: HashMap<String, Arc<AtomicUsize>>,
}

impl Cluster {
    fn new() -> Self {
        let _ = tracing_subscriber::fmt::try_init();
        Self {
            registry: MemoryRegistry::new(),
            transport: MemoryTransport::new_default(),
            hits: HashMap::new(),
        }
    }

    fn register(&mut self, id: &str) -> Arc<AtomicUsize> {
        self.registry
            .add_node("orders", "v1", Node::new(id, format!("{id}:9000")));
        let hits = Arc::new(AtomicUsize::new(0));
        self.hits.insert(id.to_string(), Arc::clone(&hits));
        hits
    }

    /// Node that answers every call with a receipt naming itself
    fn healthy(&mut self, id: &str) {
        let hits = self.register(id);
        let served_by = id.to_string();
        self.transport
            .serve(format!("{id}:9000"), move |_ctx, _request| {
                hits.fetch_add(1, Ordering::SeqCst);
                let body = serde_json::to_vec(&Receipt {
                    served_by: served_by.clone(),
                })
                .unwrap();
                async move { Ok(Message::new(body)) }
            });
    }

    /// Node that fails every call with `error`
    fn failing(&mut self, id: &str, error: TransportError) {
        let hits = self.register(id);
        self.transport
            .serve(format!("{id}:9000"), move |_ctx, _request| {
                hits.fetch_add(1, Ordering::SeqCst);
                let error = error.clone();
                async move { Err(error) }
            });
    }

    fn hits(&self, id: &str) -> usize {
        self.hits[id].load(Ordering::SeqCst)
    }

    fn client(&self) -> TestClient {
        Client::new(self.registry.clone(), self.transport.clone(), JsonCodec)
    }
}

fn place_order() -> Request<Order> {
    Request::new("orders", "Orders.Place", Order { id: 1 })
}

/// Backoff that counts how many waits the engine asked for
fn counting_backoff(delay: Duration) -> (Backoff, Arc<AtomicUsize>) {
    let waits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&waits);
    let backoff = Backoff::custom(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        delay
    });
    (backoff, waits)
}

#[tokio::test(start_paused = true)]
async fn test_success_on_first_attempt() {
    let mut cluster = Cluster::new();
    cluster.healthy("a");

    let receipt: Receipt = cluster
        .client()
        .call(&Context::new(), &place_order(), &CallOptions::default())
        .await
        .unwrap();

    assert_eq!(receipt.served_by, "a");
    assert_eq!(cluster.hits("a"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_zero_retries_means_one_attempt() {
    let mut cluster = Cluster::new();
    cluster.failing("a", TransportError::Unavailable("draining".into()));
    cluster.failing("b", TransportError::Unavailable("draining".into()));

    let (backoff, waits) = counting_backoff(Duration::from_millis(10));
    let options = CallOptions::default()
        .with_max_retries(0)
        .with_backoff(backoff);

    let result = cluster
        .client()
        .call::<_, Receipt>(&Context::new(), &place_order(), &options)
        .await;

    assert_eq!(
        result,
        Err(ClientError::RetriesExhausted {
            attempts: 1,
            last: TransportError::Unavailable("draining".into()),
        })
    );
    assert_eq!(cluster.hits("a") + cluster.hits("b"), 1);
    assert_eq!(waits.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_canceled_context_makes_no_attempt() {
    let mut cluster = Cluster::new();
    cluster.healthy("a");

    let ctx = Context::new();
    ctx.cancel();

    let result = cluster
        .client()
        .call::<_, Receipt>(&ctx, &place_order(), &CallOptions::default())
        .await;

    assert_eq!(result, Err(ClientError::Canceled));
    assert_eq!(cluster.hits("a"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_failed_nodes_are_not_retried() {
    let mut cluster = Cluster::new();
    cluster.failing("a", TransportError::ConnectionFailed("refused".into()));
    cluster.failing("b", TransportError::ConnectionFailed("refused".into()));
    cluster.healthy("c");

    let options = CallOptions::default()
        .with_max_retries(2)
        .with_backoff(Backoff::None)
        .with_strategy(Strategy::RoundRobin);

    let receipt: Receipt = cluster
        .client()
        .call(&Context::new(), &place_order(), &options)
        .await
        .unwrap();

    assert_eq!(receipt.served_by, "c");
    assert_eq!(cluster.hits("a"), 1);
    assert!(cluster.hits("b") <= 1);
    assert_eq!(cluster.hits("c"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_every_failed_node_is_skipped_before_success() {
    let mut cluster = Cluster::new();
    cluster.failing("a", TransportError::Timeout);
    cluster.failing("b", TransportError::Timeout);
    cluster.healthy("c");

    // Always take the first candidate so both failing nodes are tried
    let options = CallOptions::default()
        .with_max_retries(2)
        .with_backoff(Backoff::None)
        .with_strategy(Strategy::custom(|nodes| nodes.first()));

    let receipt: Receipt = cluster
        .client()
        .call(&Context::new(), &place_order(), &options)
        .await
        .unwrap();

    assert_eq!(receipt.served_by, "c");
    assert_eq!(
        (cluster.hits("a"), cluster.hits("b"), cluster.hits("c")),
        (1, 1, 1)
    );
}

#[tokio::test(start_paused = true)]
async fn test_missing_nodes_fail_without_backoff() {
    let cluster = Cluster::new();
    cluster.registry.register(Service::new("orders", "v1"));

    let (backoff, waits) = counting_backoff(Duration::from_secs(1));
    let options = CallOptions::default()
        .with_max_retries(3)
        .with_backoff(backoff);

    let result = cluster
        .client()
        .call::<_, Receipt>(&Context::new(), &place_order(), &options)
        .await;

    assert_eq!(result, Err(ClientError::NotFound("orders".into())));
    assert_eq!(waits.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_retries_exhausted_wraps_last_error() {
    let mut cluster = Cluster::new();
    let hits = cluster.register("a");
    cluster.transport.serve("a:9000", move |_ctx, _request| {
        let attempt = hits.fetch_add(1, Ordering::SeqCst) + 1;
        async move {
            Err::<Message, _>(TransportError::Unavailable(format!("attempt {attempt}")))
        }
    });

    let (backoff, waits) = counting_backoff(Duration::from_millis(250));
    let options = CallOptions::default()
        .with_max_retries(1)
        .with_backoff(backoff);

    let start = Instant::now();
    let result = cluster
        .client()
        .call::<_, Receipt>(&Context::new(), &place_order(), &options)
        .await;

    assert_eq!(
        result,
        Err(ClientError::RetriesExhausted {
            attempts: 2,
            last: TransportError::Unavailable("attempt 2".into()),
        })
    );
    assert_eq!(cluster.hits("a"), 2);
    assert_eq!(waits.load(Ordering::SeqCst), 1);
    assert!(start.elapsed() >= Duration::from_millis(250));
}

#[tokio::test(start_paused = true)]
async fn test_backoff_past_deadline_fails_immediately() {
    let mut cluster = Cluster::new();
    cluster.failing("a", TransportError::Unavailable("draining".into()));

    let options = CallOptions::default()
        .with_max_retries(3)
        .with_call_timeout(Duration::from_millis(50))
        .with_backoff(Backoff::Constant(Duration::from_secs(1)));

    let start = Instant::now();
    let result = cluster
        .client()
        .call::<_, Receipt>(&Context::new(), &place_order(), &options)
        .await;

    assert_eq!(result, Err(ClientError::DeadlineExceeded));
    assert_eq!(cluster.hits("a"), 1);
    assert!(start.elapsed() < Duration::from_millis(50));
}

#[tokio::test(start_paused = true)]
async fn test_slow_node_hits_shared_deadline() {
    let mut cluster = Cluster::new();
    let hits = cluster.register("a");
    cluster.transport.serve("a:9000", move |_ctx, request| {
        hits.fetch_add(1, Ordering::SeqCst);
        async move {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(request)
        }
    });

    let options = CallOptions::default()
        .with_max_retries(5)
        .with_call_timeout(Duration::from_secs(1))
        .with_backoff(Backoff::None);

    let start = Instant::now();
    let result = cluster
        .client()
        .call::<_, Receipt>(&Context::new(), &place_order(), &options)
        .await;

    assert_eq!(result, Err(ClientError::DeadlineExceeded));
    assert_eq!(cluster.hits("a"), 1);
    assert!(start.elapsed() >= Duration::from_secs(1));
    assert!(start.elapsed() < Duration::from_secs(30));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_backoff() {
    let mut cluster = Cluster::new();
    cluster.failing("a", TransportError::ConnectionClosed);

    let options = CallOptions::default()
        .with_max_retries(3)
        .without_call_timeout()
        .with_backoff(Backoff::Constant(Duration::from_secs(10)));

    let ctx = Context::new();
    let canceler = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceler.cancel();
    });

    let start = Instant::now();
    let result = cluster
        .client()
        .call::<_, Receipt>(&ctx, &place_order(), &options)
        .await;

    assert_eq!(result, Err(ClientError::Canceled));
    assert_eq!(cluster.hits("a"), 1);
    assert!(start.elapsed() < Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn test_terminal_error_is_not_retried() {
    let mut cluster = Cluster::new();
    let rejection = TransportError::Application {
        code: 422,
        message: "order already placed".into(),
    };
    cluster.failing("a", rejection.clone());
    cluster.healthy("b");

    let options = CallOptions::default()
        .with_max_retries(3)
        .with_strategy(Strategy::custom(|nodes| nodes.first()));

    let result = cluster
        .client()
        .call::<_, Receipt>(&Context::new(), &place_order(), &options)
        .await;

    assert_eq!(result, Err(ClientError::Terminal(rejection)));
    assert_eq!(cluster.hits("a"), 1);
    assert_eq!(cluster.hits("b"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_registry_outage_is_terminal() {
    let mut cluster = Cluster::new();
    cluster.healthy("a");
    cluster.registry.set_offline(true);

    let result = cluster
        .client()
        .call::<_, Receipt>(&Context::new(), &place_order(), &CallOptions::default())
        .await;

    assert!(matches!(
        result,
        Err(ClientError::Registry {
            kind: RegistryErrorKind::Unavailable,
            ..
        })
    ));
    assert_eq!(cluster.hits("a"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_caller_filters_can_exclude_everything() {
    let mut cluster = Cluster::new();
    cluster.healthy("a");

    let options = CallOptions::default().with_filter(SelectFilter::exclude(["a"]));

    let result = cluster
        .client()
        .call::<_, Receipt>(&Context::new(), &place_order(), &options)
        .await;

    assert_eq!(result, Err(ClientError::NoAvailableNodes("orders".into())));
}

#[tokio::test(start_paused = true)]
async fn test_undecodable_response_is_invalid_message() {
    let mut cluster = Cluster::new();
    cluster.healthy("a");

    let result = cluster
        .client()
        .call::<_, Order>(&Context::new(), &place_order(), &CallOptions::default())
        .await;

    assert!(matches!(result, Err(ClientError::InvalidMessage(_))));
    assert_eq!(cluster.hits("a"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_request_carries_routing_headers_and_metadata() {
    let cluster = Cluster::new();
    cluster
        .registry
        .add_node("orders", "v1", Node::new("a", "a:9000"));
    cluster.transport.serve("a:9000", |ctx, request| async move {
        let seen = HashMap::from([
            ("service", ctx.get(headers::SERVICE).map(str::to_string)),
            ("endpoint", ctx.get(headers::ENDPOINT).map(str::to_string)),
            (
                "content_type",
                request.header(headers::CONTENT_TYPE).map(str::to_string),
            ),
            ("id", request.header(headers::ID).map(str::to_string)),
            ("trace", request.header("X-Trace").map(str::to_string)),
        ]);
        Ok(Message::new(serde_json::to_vec(&seen).unwrap()))
    });

    let ctx = Context::new().with_metadata("X-Trace", "abc");
    let seen: HashMap<String, Option<String>> = cluster
        .client()
        .call(&ctx, &place_order(), &CallOptions::default())
        .await
        .unwrap();

    assert_eq!(seen["service"].as_deref(), Some("orders"));
    assert_eq!(seen["endpoint"].as_deref(), Some("Orders.Place"));
    assert_eq!(seen["content_type"].as_deref(), Some("application/json"));
    assert!(seen["id"].is_some());
    assert_eq!(seen["trace"].as_deref(), Some("abc"));
}

#[tokio::test]
async fn test_concurrent_round_robin_calls_spread_evenly() {
    let mut cluster = Cluster::new();
    cluster.healthy("a");
    cluster.healthy("b");
    cluster.healthy("c");

    let client = Arc::new(cluster.client());
    let options = CallOptions::default().with_strategy(Strategy::RoundRobin);

    let calls: Vec<_> = (0..30)
        .map(|_| {
            let client = Arc::clone(&client);
            let options = options.clone();
            tokio::spawn(async move {
                client
                    .call::<_, Receipt>(&Context::new(), &place_order(), &options)
                    .await
            })
        })
        .collect();

    for call in calls {
        call.await.unwrap().unwrap();
    }

    assert_eq!(
        (cluster.hits("a"), cluster.hits("b"), cluster.hits("c")),
        (10, 10, 10)
    );
}

#[tokio::test]
async fn test_stream_sends_request_as_first_message() {
    let cluster = Cluster::new();
    cluster
        .registry
        .add_node("orders", "v1", Node::new("a", "a:9000"));
    cluster
        .transport
        .serve_stream("a:9000", |ctx, stream| async move {
            let session = courier_stream::StreamSession::accept(&ctx, stream, JsonCodec);
            if let Ok(Some(order)) = session.recv::<Order>().await {
                for n in 0..3 {
                    let _ = session.send(&Order { id: order.id + n }).await;
                }
            }
            let _ = session.close().await;
        });

    let session = cluster
        .client()
        .stream(
            &Context::new(),
            &Request::new("orders", "Orders.Watch", Order { id: 10 }),
            &CallOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(session.request().endpoint(), "Orders.Watch");

    let mut ids = Vec::new();
    while let Some(order) = session.recv::<Order>().await.unwrap() {
        ids.push(order.id);
    }

    assert_eq!(ids, vec![10, 11, 12]);
    assert_eq!(session.error(), None);
    session.close().await.unwrap();
}

#[tokio::test]
async fn test_stream_setup_failure_returns_no_session() {
    let mut cluster = Cluster::new();
    // Serves unary calls only
    cluster.healthy("a");

    let result = cluster
        .client()
        .stream(&Context::new(), &place_order(), &CallOptions::default())
        .await;

    assert!(matches!(
        result,
        Err(ClientError::Stream(StreamError::Transport(
            TransportError::Unavailable(_)
        )))
    ));
}

#[tokio::test]
async fn test_stream_to_unknown_service_is_not_found() {
    let cluster = Cluster::new();

    let result = cluster
        .client()
        .stream(&Context::new(), &place_order(), &CallOptions::default())
        .await;

    assert!(matches!(result, Err(ClientError::NotFound(service)) if service == "orders"));
}

#[tokio::test(start_paused = true)]
async fn test_unrepresentable_backoff_fails_at_deadline() {
    let mut cluster = Cluster::new();
    cluster.failing("a", TransportError::Timeout);

    let options = CallOptions::default()
        .with_max_retries(1)
        .with_backoff(Backoff::Constant(Duration::MAX))
        .with_call_timeout(Duration::from_secs(1));

    let result = cluster
        .client()
        .call::<_, Receipt>(&Context::new(), &place_order(), &options)
        .await;

    assert_eq!(result, Err(ClientError::DeadlineExceeded));
    assert_eq!(cluster.hits("a"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unrepresentable_call_timeout_means_no_deadline() {
    let mut cluster = Cluster::new();
    cluster.healthy("a");

    let options = CallOptions::default().with_call_timeout(Duration::MAX);

    let receipt: Receipt = cluster
        .client()
        .call(&Context::new(), &place_order(), &options)
        .await
        .unwrap();

    assert_eq!(receipt.served_by, "a");
}

#[tokio::test(start_paused = true)]
async fn test_forwarded_server_context_is_rerouted() {
    let cluster = Cluster::new();
    cluster
        .registry
        .add_node("billing", "v1", Node::new("bill-1", "bill-1:9000"));
    cluster.transport.serve("bill-1:9000", |ctx, request| async move {
        let seen = (
            ctx.get(headers::SERVICE).map(str::to_string),
            ctx.get(headers::ENDPOINT).map(str::to_string),
            request.header(headers::CONTENT_TYPE).map(str::to_string),
            request.header(headers::ID).map(str::to_string),
            request.header("X-Trace").map(str::to_string),
        );
        Ok(Message::new(serde_json::to_vec(&seen).unwrap()))
    });

    // Context as an orders handler receives it
    let inbound = HashMap::from([
        (headers::SERVICE.to_string(), "orders".to_string()),
        (headers::ENDPOINT.to_string(), "Orders.Place".to_string()),
        (headers::CONTENT_TYPE.to_string(), "application/cbor".to_string()),
        (headers::ID.to_string(), "inbound-call".to_string()),
        ("X-Trace".to_string(), "abc".to_string()),
    ]);
    let ctx = Context::from_header(&inbound);

    let (service, endpoint, content_type, id, trace): (
        Option<String>,
        Option<String>,
        Option<String>,
        Option<String>,
        Option<String>,
    ) = cluster
        .client()
        .call(
            &ctx,
            &Request::new("billing", "Billing.Charge", 1u32),
            &CallOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(service.as_deref(), Some("billing"));
    assert_eq!(endpoint.as_deref(), Some("Billing.Charge"));
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert!(id.is_some_and(|id| id != "inbound-call"));
    assert_eq!(trace.as_deref(), Some("abc"));
}

#[tokio::test(start_paused = true)]
async fn test_stream_outlives_call_timeout() {
    let cluster = Cluster::new();
    cluster
        .registry
        .add_node("orders", "v1", Node::new("a", "a:9000"));
    cluster
        .transport
        .serve_stream("a:9000", |ctx, stream| async move {
            let session = courier_stream::StreamSession::accept(&ctx, stream, JsonCodec);
            let _ = session.recv::<Order>().await;
            let outcome = tokio::select! {
                _ = ctx.done() => "stopped",
                () = tokio::time::sleep(Duration::from_secs(10)) => "finished",
            };
            let _ = session.send(outcome).await;
            let _ = session.close().await;
        });

    let options = CallOptions::default().with_call_timeout(Duration::from_secs(1));
    let session = cluster
        .client()
        .stream(&Context::new(), &place_order(), &options)
        .await
        .unwrap();

    assert_eq!(
        session.recv::<String>().await,
        Ok(Some("finished".to_string()))
    );
    assert_eq!(session.error(), None);
}
