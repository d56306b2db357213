//! Price-impact estimation and execution planning
//!
//! Walks the relevant side of a book to cost a hypothetical market
//! order, decomposes temporary vs. permanent impact, samples depth
//! curves, and proposes split/TWAP/VWAP/adaptive execution strategies.
//! The planner only estimates and recommends — it never places orders.

#![warn(missing_docs)]

pub mod depth_curve;
pub mod impact;
pub mod strategy;

pub use depth_curve::{DepthCurve, DepthCurveConfig, DepthPoint, build_depth_curve};
pub use impact::{ExecutionStep, ImpactConfig, ImpactEstimate, estimate_impact};
pub use strategy::{ExecutionPlan, ExecutionStyle, StrategyConfig, plan_execution};
