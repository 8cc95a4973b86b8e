pub mod cloudfront;
pub mod lambda;
