pub mod support;

mod audit_test;
mod planner_test;
