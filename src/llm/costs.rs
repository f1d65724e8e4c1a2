//! Per-token pricing for the supported chat models.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// (input, output) USD cost per token for `model`.
///
/// Unknown models are priced like base GPT-4 so estimates err high.
pub fn model_cost(model: &str) -> (Decimal, Decimal) {
    match model {
        m if m.starts_with("gpt-4o-mini") => (dec!(0.00000015), dec!(0.0000006)),
        m if m.starts_with("gpt-4o") => (dec!(0.0000025), dec!(0.00001)),
        m if m.starts_with("gpt-4-turbo") => (dec!(0.00001), dec!(0.00003)),
        m if m.starts_with("gpt-3.5-turbo") => (dec!(0.0000005), dec!(0.0000015)),
        _ => (dec!(0.00003), dec!(0.00006)),
    }
}

/// Estimated USD cost of one call.
pub fn estimate_cost(
    (input_cost, output_cost): (Decimal, Decimal),
    input_tokens: u32,
    output_tokens: u32,
) -> Decimal {
    input_cost * Decimal::from(input_tokens) + output_cost * Decimal::from(output_tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpt4_is_priced_above_gpt35() {
        let (gpt4_in, gpt4_out) = model_cost("gpt-4");
        let (gpt35_in, gpt35_out) = model_cost("gpt-3.5-turbo");
        assert!(gpt4_in > gpt35_in);
        assert!(gpt4_out > gpt35_out);
    }

    #[test]
    fn mini_is_not_priced_as_4o() {
        assert_ne!(model_cost("gpt-4o-mini"), model_cost("gpt-4o"));
    }

    #[test]
    fn estimate_sums_both_directions() {
        let cost = estimate_cost((dec!(0.001), dec!(0.002)), 100, 50);
        assert_eq!(cost, dec!(0.2));
    }
}
