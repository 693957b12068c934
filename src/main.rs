use glpaint_engine::prelude::*;

fn main() {
    let painter = Painter::new(
        env!("CARGO_PKG_VERSION"),
        "config.yml",
        include_resource!(open: "config.yml"),
    )
    .unwrap_or_log("Init");

    // Building needs a current context; without one we can only report the plan.
    painter.preflight();
}
