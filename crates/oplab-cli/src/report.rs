//! Plain-text narration of the demo results.

use std::fmt;

use oplab_scenarios::RouteCost;
use oplab_scenarios::transport::DummySide;
use oplab_solver::NetworkStats;

use crate::pipeline::{NetworkOutput, ProductionOutput, Sensitivity, TransportOutput};

pub struct ProductionText<'a>(pub &'a ProductionOutput);

pub struct NetworkText<'a>(pub &'a NetworkOutput);

pub struct TransportText<'a>(pub &'a TransportOutput);

fn heading(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f, "{}", title)?;
    writeln!(f, "{}", "=".repeat(title.len()))
}

fn sensitivity<D>(f: &mut fmt::Formatter<'_>, label: &str, s: &Sensitivity<D>) -> fmt::Result {
    if s.points.is_empty() {
        return Ok(());
    }
    writeln!(f, "  {}:", label)?;
    for p in &s.points {
        writeln!(
            f,
            "    {:+5.0}% -> {:10.2} ({:+.2})   coefficient {:.2}",
            p.delta_pct, p.objective, p.change, p.coefficient
        )?;
    }
    Ok(())
}

fn routes(f: &mut fmt::Formatter<'_>, routes: &[RouteCost]) -> fmt::Result {
    for r in routes {
        let lane = match &r.product {
            Some(p) => format!("{} {} -> {}", r.from, p, r.to),
            None => format!("{} -> {}", r.from, r.to),
        };
        writeln!(
            f,
            "  {:40} {:10.2} x {:6.2} = {:10.2} ({:5.1}%)",
            lane, r.quantity, r.unit_cost, r.total_cost, r.share_pct
        )?;
    }
    Ok(())
}

fn stats(f: &mut fmt::Formatter<'_>, s: &NetworkStats) -> fmt::Result {
    writeln!(
        f,
        "  {} nodes, {} edges, density {:.3}, {}",
        s.nodes,
        s.edges,
        s.density,
        if s.connected { "connected" } else { "disconnected" }
    )?;
    if let (Some(d), Some(avg)) = (s.diameter, s.average_path_length) {
        writeln!(f, "  Diameter: {:.1}  Average path length: {:.1}", d, avg)?;
    }
    Ok(())
}

impl fmt::Display for ProductionText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let out = self.0;
        let report = &out.report;
        heading(f, "Production planning")?;
        writeln!(f, "Status: OPTIMAL")?;
        writeln!(f, "Maximum profit: {:.2}", report.result.objective_value)?;
        writeln!(f)?;

        writeln!(f, "Plan:")?;
        for line in &report.plan {
            writeln!(
                f,
                "  {:20} {:10.2} units  profit {:10.2} ({:5.1}%)",
                line.product, line.quantity, line.contribution, line.share_pct
            )?;
        }
        writeln!(f)?;

        writeln!(f, "Resources:")?;
        for r in &report.resources {
            writeln!(
                f,
                "  {:20} {:10.2} / {:10.2} ({:5.1}%){}",
                r.name,
                r.used,
                r.available,
                r.utilization_pct,
                if r.bottleneck { "  bottleneck" } else { "" }
            )?;
        }
        if !report.binding.is_empty() {
            writeln!(f, "Binding constraints (pinch points):")?;
            for name in &report.binding {
                writeln!(f, "  - {}", name)?;
            }
        }
        if let Some(best) = &report.most_profitable {
            writeln!(f, "Highest unit profit: {}", best)?;
        }

        if out.sensitivity.iter().any(|s| !s.points.is_empty()) {
            writeln!(f)?;
            writeln!(f, "Profit sensitivity:")?;
            for s in &out.sensitivity {
                sensitivity(f, &s.dimension, s)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for NetworkText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let out = self.0;

        let mf = &out.max_flow;
        heading(f, "Maximum flow")?;
        writeln!(f, "Maximum flow {} -> {}: {:.2}", mf.flow.source, mf.flow.sink, mf.flow.value)?;
        writeln!(f, "Minimum cut capacity: {:.2}", mf.min_cut_capacity)?;
        for e in &mf.edges {
            writeln!(
                f,
                "  {:>8} -> {:<8} {:8.2} / {:8.2} ({:5.1}%)",
                e.from, e.to, e.flow, e.capacity, e.utilization_pct
            )?;
        }
        if !mf.bottlenecks.is_empty() {
            writeln!(f, "Saturated arcs: {}", mf.bottlenecks.join(", "))?;
        }
        stats(f, &mf.stats)?;
        writeln!(f)?;

        let mc = &out.min_cost_flow;
        heading(f, "Minimum-cost flow")?;
        writeln!(f, "Total supply: {:.2}  Total demand: {:.2}", mc.total_supply, mc.total_demand)?;
        writeln!(f, "Minimum cost: {:.2}", mc.result.objective_value)?;
        routes(f, &mc.routes)?;
        writeln!(f, "Average cost per unit: {:.2}", mc.average_unit_cost)?;
        for u in mc.capacity_usage.iter().filter(|u| u.bottleneck) {
            writeln!(f, "  at capacity: {}", u.name)?;
        }
        writeln!(f)?;

        let sp = &out.shortest_path;
        heading(f, "Shortest path")?;
        writeln!(f, "Shortest distance: {:.1}", sp.route.distance)?;
        writeln!(f, "Path: {}", sp.route.path.join(" -> "))?;
        for (i, leg) in sp.route.legs.iter().enumerate() {
            writeln!(
                f,
                "  leg {}: {} -> {}, {:.1} (cumulative {:.1})",
                i + 1,
                leg.from,
                leg.to,
                leg.distance,
                leg.cumulative
            )?;
        }
        stats(f, &sp.stats)
    }
}

impl fmt::Display for TransportText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let out = self.0;

        let basic = &out.basic;
        heading(f, "Transportation")?;
        match &basic.dummy {
            Some(d) if d.side == DummySide::Destination => {
                writeln!(f, "Supply exceeds demand; {} absorbs {:.2}", d.name, d.amount)?
            }
            Some(d) => writeln!(f, "Demand exceeds supply; {} covers {:.2}", d.name, d.amount)?,
            None => writeln!(f, "Supply and demand are balanced")?,
        }
        writeln!(f, "Minimum cost: {:.2}", basic.result.objective_value)?;
        routes(f, &basic.routes)?;
        writeln!(
            f,
            "Shipped: {:.2} over {} routes, {:.2} per unit",
            basic.total_quantity,
            basic.routes.len(),
            basic.average_unit_cost
        )?;
        if let (Some(hi), Some(lo)) = (&basic.most_expensive_route, &basic.cheapest_route) {
            writeln!(f, "Most expensive lane used: {} -> {} at {:.2}", hi.from, hi.to, hi.unit_cost)?;
            writeln!(f, "Cheapest lane used: {} -> {} at {:.2}", lo.from, lo.to, lo.unit_cost)?;
        }
        writeln!(f)?;

        let multi = &out.multi_product;
        heading(f, "Multi-product transportation")?;
        writeln!(f, "Minimum cost: {:.2}", multi.result.objective_value)?;
        routes(f, &multi.routes)?;
        for p in &multi.products {
            writeln!(
                f,
                "  {:20} {:10.2} units, cost {:10.2} ({:5.1}%), {:.2} per unit",
                p.product, p.quantity, p.cost, p.share_pct, p.average_unit_cost
            )?;
        }

        if out.sensitivity.iter().any(|s| !s.points.is_empty()) {
            writeln!(f)?;
            writeln!(f, "Route cost sensitivity:")?;
            for s in &out.sensitivity {
                let label = format!("{} -> {}", s.dimension.origin, s.dimension.destination);
                sensitivity(f, &label, s)?;
            }
        }
        Ok(())
    }
}
