pub mod amortization;
pub mod comps;
pub mod evaluation;
