pub mod sequential_composite_executor;
pub mod threaded_composite_executor;

#[cfg(test)]
pub(crate) mod test_support;
