pub mod method_policy;
