use std::collections::BTreeSet;

use fdkey::model::{build_model, ModelPlan};
use fdkey::{candidate_key, fds, ScipSolver};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Order lines: an order determines its customer and date, a customer
    // their region, and (order, line) the product and quantity.
    let deps = fds! {
        order -> customer, date;
        customer -> region;
        order, line -> product, qty;
        product -> price;
    };
    let schema: BTreeSet<String> = [
        "order", "customer", "date", "region", "line", "product", "qty", "price",
    ]
    .map(String::from)
    .into();

    if let ModelPlan::Model(m) = build_model(&deps, &schema)? {
        std::fs::write("order_lines.lp", m.ilp().to_lp())?;
        eprintln!("wrote order_lines.lp ({} rounds)", m.rounds());
    }

    // override binary: SCIP_BIN=/path/to/scip
    let solver = ScipSolver::from_env().with_time_limit(60.0);
    let found = candidate_key(&schema, &deps, &solver)?;

    println!("=== minimum key ===");
    for a in &found.key {
        println!("{a}");
    }
    if let Some(v) = found.objective {
        println!("objective = {v}");
    }
    Ok(())
}
