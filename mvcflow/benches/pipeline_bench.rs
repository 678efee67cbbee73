//! Benchmarks for controller execution.

use async_trait::async_trait;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mvcflow::prelude::*;
use std::sync::Arc;

#[derive(Debug)]
struct HeaderMixin(&'static str);

#[async_trait]
impl Mixin for HeaderMixin {
    fn name(&self) -> &str {
        self.0
    }

    async fn before(&self, state: &ExecutionState) -> HookResult {
        state.set_header(format!("x-{}", self.0), "1");
        Ok(())
    }
}

fn pipeline_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime");
    let mixins: Vec<Arc<dyn Mixin>> = vec![
        Arc::new(HeaderMixin("a")),
        Arc::new(HeaderMixin("b")),
        Arc::new(HeaderMixin("c")),
    ];
    let class = Arc::new(ControllerType::new("Bench").with_mixins(mixins));
    let request = Request::new()
        .with_param("action", "index")
        .with_header("x-real-ip", "10.0.0.1");

    c.bench_function("execute_three_mixins", |b| {
        b.iter(|| {
            let mut controller = Controller::new(class.clone(), BaseActions, request.clone());
            black_box(runtime.block_on(controller.execute(None, false)))
        });
    });

    c.bench_function("execute_reused_controller", |b| {
        let mut controller = Controller::new(class.clone(), BaseActions, request.clone());
        b.iter(|| black_box(runtime.block_on(controller.execute(None, false))));
    });
}

criterion_group!(benches, pipeline_benchmark);
criterion_main!(benches);
