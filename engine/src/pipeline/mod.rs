// Transform stages, applied in order:
// normalize (headers + amounts) -> reshape (unpivot) ->
// intervals (chart bars) | aggregate (monetary summaries).
pub mod aggregate;
pub mod intervals;
pub mod normalize;
pub mod reshape;
