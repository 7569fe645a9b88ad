mod rates;

pub(crate) use rates::{RateCard, calculate_cost};
