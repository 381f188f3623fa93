pub mod settings;

pub use settings::{
    AmountPolicy, CanonicalColumn, PaidTotalPolicy, PipelineSettings, TAX_RATE,
};
