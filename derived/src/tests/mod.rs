// Analysis tests
mod analysis;


mod jsonpath;


// Evaluator tests
mod context;

// Engine tests
mod engine;
