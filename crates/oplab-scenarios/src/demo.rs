//! Fixed textbook instances used by the `oplab` binary and the tests.

use crate::max_flow::{Arc, FlowNetworkScenario};
use crate::min_cost_flow::{MinCostFlowScenario, Route};
use crate::multi_product::MultiProductScenario;
use crate::production::{Product, ProductionScenario, Resource};
use crate::shortest_path::{Road, RoadNetworkScenario};
use crate::transport::{Site, TransportScenario};

/// Percentage changes applied by sensitivity runs unless overridden
pub const DEFAULT_DELTAS: [f64; 4] = [-20.0, -10.0, 10.0, 20.0];

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Three products competing for labor and material
pub fn production() -> ProductionScenario {
    let product = |name: &str, profit: f64, labor: f64, material: f64| Product {
        name: name.to_string(),
        profit,
        requirements: vec![labor, material],
    };
    ProductionScenario {
        resources: vec![
            Resource {
                name: "Labor".to_string(),
                unit: Some("hours".to_string()),
                available: 100.0,
            },
            Resource {
                name: "Material".to_string(),
                unit: Some("kg".to_string()),
                available: 80.0,
            },
        ],
        products: vec![
            product("Product A", 40.0, 2.0, 1.0),
            product("Product B", 30.0, 1.0, 2.0),
            product("Product C", 50.0, 3.0, 1.0),
        ],
    }
}

/// Six-node pipe network from S to T
pub fn max_flow_network() -> FlowNetworkScenario {
    FlowNetworkScenario {
        nodes: names(&["S", "A", "B", "C", "D", "T"]),
        arcs: vec![
            Arc::new("S", "A", 16.0),
            Arc::new("S", "B", 13.0),
            Arc::new("A", "B", 4.0),
            Arc::new("A", "C", 12.0),
            Arc::new("B", "D", 14.0),
            Arc::new("C", "B", 9.0),
            Arc::new("C", "T", 20.0),
            Arc::new("D", "C", 7.0),
            Arc::new("D", "T", 4.0),
        ],
        source: "S".to_string(),
        sink: "T".to_string(),
    }
}

/// Two warehouses serving three customers over capacitated lanes
pub fn min_cost_flow() -> MinCostFlowScenario {
    MinCostFlowScenario {
        sources: vec![Site::new("Warehouse 1", 100.0), Site::new("Warehouse 2", 150.0)],
        sinks: vec![
            Site::new("Customer A", 80.0),
            Site::new("Customer B", 90.0),
            Site::new("Customer C", 80.0),
        ],
        routes: vec![
            Route::new("Warehouse 1", "Customer A", 4.0, 60.0),
            Route::new("Warehouse 1", "Customer B", 6.0, 70.0),
            Route::new("Warehouse 1", "Customer C", 8.0, 50.0),
            Route::new("Warehouse 2", "Customer A", 5.0, 50.0),
            Route::new("Warehouse 2", "Customer B", 3.0, 80.0),
            Route::new("Warehouse 2", "Customer C", 7.0, 60.0),
        ],
    }
}

/// Six cities joined by two-way roads, distances in km
pub fn road_network() -> RoadNetworkScenario {
    RoadNetworkScenario {
        cities: names(&["Start", "City A", "City B", "City C", "City D", "End"]),
        roads: vec![
            Road::new("Start", "City A", 10.0),
            Road::new("Start", "City B", 15.0),
            Road::new("City A", "City C", 12.0),
            Road::new("City A", "City D", 15.0),
            Road::new("City B", "City C", 8.0),
            Road::new("City B", "City D", 7.0),
            Road::new("City C", "End", 10.0),
            Road::new("City D", "End", 12.0),
            Road::new("City A", "City B", 6.0),
            Road::new("City C", "City D", 5.0),
        ],
        origin: "Start".to_string(),
        destination: "End".to_string(),
    }
}

/// Three factories shipping to four warehouses; supply equals demand
pub fn transport() -> TransportScenario {
    TransportScenario {
        origins: vec![
            Site::new("Factory A", 300.0),
            Site::new("Factory B", 400.0),
            Site::new("Factory C", 500.0),
        ],
        destinations: vec![
            Site::new("Warehouse 1", 250.0),
            Site::new("Warehouse 2", 350.0),
            Site::new("Warehouse 3", 400.0),
            Site::new("Warehouse 4", 200.0),
        ],
        costs: vec![
            vec![8.0, 6.0, 10.0, 9.0],
            vec![9.0, 12.0, 13.0, 7.0],
            vec![14.0, 9.0, 16.0, 5.0],
        ],
    }
}

/// Two factories, two products, three markets
pub fn multi_product() -> MultiProductScenario {
    MultiProductScenario {
        origins: names(&["Factory X", "Factory Y"]),
        products: names(&["Product P1", "Product P2"]),
        destinations: names(&["Market M1", "Market M2", "Market M3"]),
        supply: vec![vec![200.0, 150.0], vec![180.0, 220.0]],
        demand: vec![vec![120.0, 100.0], vec![140.0, 130.0], vec![120.0, 140.0]],
        costs: vec![
            vec![vec![5.0, 7.0, 6.0], vec![6.0, 8.0, 7.0]],
            vec![vec![8.0, 6.0, 9.0], vec![7.0, 5.0, 8.0]],
        ],
    }
}
