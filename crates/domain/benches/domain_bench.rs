use chrono::Utc;
use common::OrderId;
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{
    Actor, Money, Order, OrderCode, OrderItem, OrderStatus, PlaceOrder, ServiceType,
    TransitionRequest, compute_order_total,
};

fn make_items(count: usize) -> Vec<OrderItem> {
    (0..count)
        .map(|i| OrderItem::new(format!("Product {i}"), 1 + (i % 3) as u32, Money::from_cents(100 * i as i64 + 500)))
        .collect()
}

fn make_order(items: usize) -> Order {
    let cmd = PlaceOrder::new(ServiceType::Delivery, make_items(items));
    Order::place(cmd, OrderId::new(), OrderCode::new('A', 123), Utc::now()).unwrap()
}

fn bench_compute_total(c: &mut Criterion) {
    let items = make_items(50);

    c.bench_function("domain/compute_total_50_items", |b| {
        b.iter(|| compute_order_total(&items));
    });
}

fn bench_place_order(c: &mut Criterion) {
    let items = make_items(10);

    c.bench_function("domain/place_order", |b| {
        b.iter(|| {
            let cmd = PlaceOrder::new(ServiceType::Balcao, items.clone());
            Order::place(cmd, OrderId::new(), OrderCode::new('A', 500), Utc::now()).unwrap()
        });
    });
}

fn bench_full_lifecycle(c: &mut Criterion) {
    let template = make_order(5);
    let steps = [
        TransitionRequest::to(OrderStatus::EmPreparo),
        TransitionRequest::to(OrderStatus::Pronto),
        TransitionRequest::to(OrderStatus::SaiuEntrega).with_courier("Carlos", "11999990000"),
        TransitionRequest::to(OrderStatus::Entregue)
            .by(Actor::new("u-1", "Ana"))
            .confirming_payment(),
    ];

    c.bench_function("domain/plan_and_apply_full_lifecycle", |b| {
        b.iter(|| {
            let mut order = template.clone();
            for step in &steps {
                let patch = order.plan_transition(step, Utc::now()).unwrap();
                order.apply(&patch);
            }
            order
        });
    });
}

fn bench_rejected_transition(c: &mut Criterion) {
    let order = make_order(5);
    let request = TransitionRequest::to(OrderStatus::Entregue);

    c.bench_function("domain/plan_rejected_transition", |b| {
        b.iter(|| order.plan_transition(&request, Utc::now()).is_err());
    });
}

criterion_group!(
    benches,
    bench_compute_total,
    bench_place_order,
    bench_full_lifecycle,
    bench_rejected_transition,
);
criterion_main!(benches);
