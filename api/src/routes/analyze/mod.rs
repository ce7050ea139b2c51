pub mod analyze_route;
pub mod optimal_ranges_route;
