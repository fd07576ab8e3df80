use chrono::Utc;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use domain::{
    Money, Order, OrderCode, OrderItem, OrderStatus, PlaceOrder, ServiceType, TransitionRequest,
};
use order_store::{InMemoryOrderStore, OrderId, OrderQuery, OrderStore};

fn make_order(code: u16) -> Order {
    let cmd = PlaceOrder::new(
        ServiceType::Balcao,
        vec![OrderItem::new("X-Burger", 1, Money::from_cents(2500))],
    );
    Order::place(cmd, OrderId::new(), OrderCode::new('A', code), Utc::now()).unwrap()
}

async fn populate(store: &InMemoryOrderStore, count: u16) -> Vec<Order> {
    let mut orders = Vec::with_capacity(count as usize);
    for i in 0..count {
        let order = make_order(100 + i);
        store.create(&order).await.unwrap();
        orders.push(order);
    }
    orders
}

fn bench_create(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("order_store/create", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryOrderStore::new();
                store.create(&make_order(123)).await.unwrap();
            });
        });
    });
}

fn bench_conditional_update(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("order_store/conditional_update", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryOrderStore::new();
                let order = make_order(123);
                store.create(&order).await.unwrap();
                let patch = order
                    .plan_transition(&TransitionRequest::to(OrderStatus::EmPreparo), Utc::now())
                    .unwrap();
                store
                    .conditional_update(order.id, OrderStatus::Pendente, &patch)
                    .await
                    .unwrap()
            });
        });
    });
}

fn bench_list_active(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("order_store/list_active");

    for size in [50u16, 200, 800] {
        let store = InMemoryOrderStore::new();
        rt.block_on(populate(&store, size));

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| rt.block_on(store.list(OrderQuery::active())).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_create, bench_conditional_update, bench_list_active);
criterion_main!(benches);
