//! 订单示例：工作单元提交后分发事件、并发冲突后重新加载重试
//!
//! 运行：`RUST_LOG=debug cargo run -p txflow-application --example order_workflow`
use std::sync::Arc;
use txflow_application::{AppResult, UnitOfWork};
use txflow_domain::aggregate::Aggregate;
use txflow_domain::domain_event::EventContext;
use txflow_domain::entity::Entity;
use txflow_domain::error::{DomainError, DomainResult};
use txflow_domain::eventing::{
    DispatchConfig, DispatchMode, EventDispatcher, HandlerRegistry, handler_fn, typed_handler,
};
use txflow_domain::persist::InMemoryStorage;
use txflow_domain::{aggregate, event};

#[event]
enum OrderEvent {
    Placed { customer: String },
    #[event(event_type = "LineAdded")]
    LineAdded { sku: String, qty: u32 },
}

#[aggregate(id = String, event = OrderEvent, name = "Order")]
struct Order {
    customer: String,
    lines: Vec<(String, u32)>,
}

impl Order {
    fn place(id: &str, customer: &str) -> Self {
        let mut order = Order::new(id.to_string());
        order.customer = customer.to_string();
        order.raise_event(OrderEvent::Placed {
            customer: customer.to_string(),
        });
        order.increment_version();
        order
    }

    fn add_line(&mut self, sku: &str, qty: u32) -> DomainResult<()> {
        if qty == 0 {
            return Err(DomainError::InvalidValue {
                reason: format!("qty for {sku} must be > 0"),
            });
        }
        self.lines.push((sku.to_string(), qty));
        self.raise_event(OrderEvent::LineAdded {
            sku: sku.to_string(),
            qty,
        });
        self.increment_version();
        Ok(())
    }
}

fn dispatcher() -> EventDispatcher {
    let mut registry = HandlerRegistry::new();
    registry
        .register(
            "LineAdded",
            typed_handler("inventory", |ev: OrderEvent| async move {
                if let OrderEvent::LineAdded { sku, qty } = ev {
                    println!("  inventory: reserve {qty} x {sku}");
                }
                Ok(())
            }),
        )
        .register_all(handler_fn("audit", |ev| async move {
            println!(
                "  audit: {} {}#{} {}",
                ev.event_type(),
                ev.aggregate_type(),
                ev.aggregate_id(),
                ev.aggregate_version()
            );
            Ok(())
        }));

    EventDispatcher::new(
        registry,
        DispatchConfig::builder()
            .mode(DispatchMode::Concurrent)
            .handler_timeout_ms(500)
            .build(),
    )
}

fn scope(storage: &Arc<InMemoryStorage>, request: &str) -> UnitOfWork {
    UnitOfWork::builder()
        .storage(storage.clone())
        .dispatcher(dispatcher())
        .context(
            EventContext::builder()
                .correlation_id(request.to_string())
                .build(),
        )
        .build()
}

async fn add_line(storage: &Arc<InMemoryStorage>, sku: &'static str) -> AppResult<()> {
    loop {
        let mut uow = scope(storage, sku);
        let result = uow
            .run(move |uow| {
                Box::pin(async move {
                    let mut orders = uow.repository::<Order>()?;
                    orders.load(&"42".to_string()).await?.add_line(sku, 1)?;
                    Ok(())
                })
            })
            .await;

        match result {
            Err(err) if err.is_concurrency_conflict() => {
                println!("  conflict, retrying: {err}");
                continue;
            }
            other => return other.map(|_| ()),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let storage = Arc::new(InMemoryStorage::new());

    println!("place order");
    let mut uow = scope(&storage, "req-1");
    uow.begin().await?;
    uow.repository::<Order>()?
        .add(Order::place("42", "alice"))?
        .add_line("apple", 2)?;
    let report = uow.commit().await?;
    println!("  {report}");

    println!("add lines from two requests");
    let (a, b) = tokio::join!(add_line(&storage, "pear"), add_line(&storage, "plum"));
    a?;
    b?;

    println!("rejected change");
    let mut uow = scope(&storage, "req-bad");
    let err = uow
        .run(|uow| {
            Box::pin(async move {
                let mut orders = uow.repository::<Order>()?;
                orders.load(&"42".to_string()).await?.add_line("fig", 0)?;
                Ok(())
            })
        })
        .await
        .unwrap_err();
    println!("  rolled back: {err}");

    let snapshot = storage.snapshot(&txflow_domain::persist::EntityKey::new("Order", "42"))?;
    if let Some(snapshot) = snapshot {
        let order: Order = snapshot.to_aggregate()?;
        println!("final {} lines={:?}", order.version(), order.lines);
    }
    Ok(())
}
