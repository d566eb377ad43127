use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use txflow_domain::aggregate::Aggregate;
use txflow_domain::domain_event::EventContext;
use txflow_domain::entity::Entity;
use txflow_domain::error::{DomainError, DomainResult};
use txflow_domain::eventing::{
    DispatchConfig, DispatchMode, EventDispatcher, EventHandler, HandledEventType, HandlerError,
    HandlerRegistry, handler_fn, typed_handler,
};
use txflow_domain::persist::{SerializedEvent, drain_events};
use txflow_domain::value_object::Version;
use txflow_domain::{aggregate, entity_id, event};

#[entity_id]
struct AccountId(String);

#[event(version = 1)]
enum AccountEvent {
    Opened { owner: String },
    Deposited { amount: i64 },
    #[event(event_type = "account.frozen")]
    Frozen,
}

#[aggregate(id = AccountId, event = AccountEvent, name = "Account")]
struct Account {
    owner: String,
    balance: i64,
    frozen: bool,
}

impl Account {
    fn open(id: &str, owner: &str) -> Self {
        let mut acc = Account::new(AccountId::new(id.to_string()));
        acc.owner = owner.to_string();
        acc.raise_event(AccountEvent::Opened {
            owner: owner.to_string(),
        });
        acc.increment_version();
        acc
    }

    fn deposit(&mut self, amount: i64) -> DomainResult<()> {
        if self.frozen {
            return Err(DomainError::InvalidState {
                reason: "account frozen".into(),
            });
        }
        if amount <= 0 {
            return Err(DomainError::InvalidValue {
                reason: "amount must be > 0".into(),
            });
        }
        self.balance += amount;
        self.raise_event(AccountEvent::Deposited { amount });
        self.increment_version();
        Ok(())
    }

    fn freeze(&mut self) {
        self.frozen = true;
        self.raise_event(AccountEvent::Frozen);
        self.increment_version();
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// 只关心冻结事件的处理器，通过 `handled_event_type` 声明订阅
struct FreezeAlarm {
    hits: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl EventHandler for FreezeAlarm {
    fn handler_name(&self) -> &str {
        "freeze-alarm"
    }

    fn handled_event_type(&self) -> HandledEventType {
        HandledEventType::One("account.frozen".into())
    }

    async fn handle(&self, event: &SerializedEvent) -> anyhow::Result<()> {
        anyhow::ensure!(event.aggregate_type() == "Account", "unexpected aggregate");
        self.hits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn account_events_flow_from_aggregate_to_handlers() {
    init_tracing();

    let mut acc = Account::open("acc-1", "alice");
    acc.deposit(50).unwrap();
    assert!(acc.deposit(-1).is_err());
    acc.freeze();
    assert!(acc.deposit(1).is_err());
    assert_eq!(acc.version(), Version::from_value(3));

    let ctx = EventContext::builder()
        .correlation_id("cor-1".to_string())
        .build();
    let events = drain_events(&mut acc, &ctx).unwrap();
    assert!(acc.pending_events().is_empty());

    let balances = Arc::new(Mutex::new(Vec::new()));
    let sink = balances.clone();
    let hits = Arc::new(AtomicUsize::new(0));

    let mut registry = HandlerRegistry::from_handlers([Arc::new(FreezeAlarm {
        hits: hits.clone(),
    }) as Arc<dyn EventHandler>]);
    registry.register(
        "AccountEvent.Deposited",
        typed_handler("ledger", move |ev: AccountEvent| {
            let sink = sink.clone();
            async move {
                if let AccountEvent::Deposited { amount } = ev {
                    sink.lock().unwrap().push(amount);
                }
                Ok(())
            }
        }),
    );

    let dispatcher = EventDispatcher::new(registry, DispatchConfig::default());
    let report = dispatcher.dispatch(&events).await.unwrap();

    assert!(report.is_success());
    assert_eq!(report.events_dispatched, 3);
    assert_eq!(report.handler_invocations, 2);
    assert_eq!(*balances.lock().unwrap(), [50]);
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    assert!(events.iter().all(|e| e.aggregate_id() == "acc-1"));
    assert!(events.iter().all(|e| e.correlation_id() == Some("cor-1")));
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_dispatch_isolates_every_failure_kind() {
    init_tracing();

    let mut acc = Account::open("acc-2", "bob");
    acc.deposit(10).unwrap();
    let events = drain_events(&mut acc, &EventContext::default()).unwrap();

    let ok_calls = Arc::new(AtomicUsize::new(0));
    let ok = ok_calls.clone();
    let mut registry = HandlerRegistry::new();
    registry
        .register_all(handler_fn("errors", |_| async {
            Err(anyhow::anyhow!("downstream unavailable"))
        }))
        .register_all(handler_fn("panics", |ev| async move {
            if ev.event_type().is_empty() {
                return Ok(());
            }
            panic!("bad payload in {}", ev.event_type());
        }))
        .register_all(handler_fn("hangs", |_| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        }))
        .register_all(handler_fn("works", move |_| {
            let ok = ok.clone();
            async move {
                ok.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }));

    let config = DispatchConfig::builder()
        .mode(DispatchMode::Concurrent)
        .max_concurrency(4)
        .handler_timeout_ms(50)
        .build();
    let report = EventDispatcher::new(registry, config)
        .dispatch(&events)
        .await
        .unwrap();

    assert_eq!(ok_calls.load(Ordering::SeqCst), 2);
    assert_eq!(report.handler_invocations, 8);
    assert_eq!(
        report.failed_handlers(),
        ["errors", "panics", "hangs", "errors", "panics", "hangs"]
    );
    assert!(matches!(report.failures[0].error, HandlerError::Failed { .. }));
    assert_eq!(
        report.failures[1].error,
        HandlerError::Panicked {
            reason: "bad payload in AccountEvent.Opened".into()
        }
    );
    assert!(matches!(
        report.failures[2].error,
        HandlerError::TimedOut { .. }
    ));
    assert_eq!(report.failures[3].event_id, events[1].event_id());
}

#[tokio::test]
async fn typed_handler_reports_undecodable_payload_as_failure() {
    #[event]
    enum Unrelated {
        Other { value: bool },
    }

    let mut acc = Account::open("acc-3", "carol");
    let events = drain_events(&mut acc, &EventContext::default()).unwrap();

    let mut registry = HandlerRegistry::new();
    registry.register_all(typed_handler("wrong-type", |_: Unrelated| async { Ok(()) }));

    let report = EventDispatcher::new(registry, DispatchConfig::default())
        .dispatch(&events)
        .await
        .unwrap();
    assert_eq!(report.failed_handlers(), ["wrong-type"]);
}

#[test]
fn entity_id_round_trips_through_display_and_parse() {
    let id: AccountId = "acc-9".parse().unwrap();
    assert_eq!(id.to_string(), "acc-9");
    assert_eq!(id, AccountId::from("acc-9".to_string()));

    let acc = Account::new(id.clone());
    let json = serde_json::to_value(&acc).unwrap();
    assert_eq!(json["id"], "acc-9");
}
