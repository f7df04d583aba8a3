//! BHYT contribution amounts.
//!
//! `base` is the monthly contribution for a full-rate participant:
//! reference salary × contribution rate. Household members get progressive
//! discounts; ethnic-minority and agriculture groups are subsidized at a
//! flat rate.

/// Mức lương cơ sở (VND/month).
pub const REFERENCE_SALARY: i64 = 2_340_000;

/// Contribution rate of the reference salary.
pub const CONTRIBUTION_RATE: f64 = 0.045;

/// Share of the base paid by household participants 1..=5. Participants
/// beyond the fifth pay the last rate.
const HGD_SHARE_RATES: [f64; 5] = [1.0, 0.7, 0.6, 0.5, 0.4];

pub const OBJECT_HGD: &str = "HGD";
pub const OBJECT_DTTS: &str = "DTTS";
pub const OBJECT_NLN: &str = "NLN";

/// Amount in VND owed for one declaration record.
///
/// For households the record covers participants 1..=`participant_number`
/// of the family, so their discounted shares are summed. Unknown object
/// types yield zero. Rounded to the nearest đồng.
pub fn calculate_actual_amount(object_type: &str, participant_number: i32, months: i32) -> i64 {
    if months <= 0 {
        return 0;
    }
    let base = REFERENCE_SALARY as f64 * CONTRIBUTION_RATE;

    let monthly = match object_type {
        OBJECT_HGD => {
            if participant_number < 1 {
                return 0;
            }
            (1..=participant_number)
                .map(|i| {
                    let idx = (i as usize).min(HGD_SHARE_RATES.len()) - 1;
                    base * HGD_SHARE_RATES[idx]
                })
                .sum()
        }
        OBJECT_DTTS => base * 0.3,
        OBJECT_NLN => base * 0.7,
        _ => return 0,
    };

    (monthly * months as f64).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    // base = 2_340_000 * 0.045 = 105_300 VND/month

    #[test]
    fn test_household_single_participant() {
        assert_eq!(calculate_actual_amount(OBJECT_HGD, 1, 12), 1_263_600);
        assert_eq!(calculate_actual_amount(OBJECT_HGD, 1, 3), 315_900);
    }

    #[test]
    fn test_household_second_participant_adds_discounted_share() {
        let one = calculate_actual_amount(OBJECT_HGD, 1, 12);
        let two = calculate_actual_amount(OBJECT_HGD, 2, 12);
        // 70% of base for 12 months
        assert_eq!(two - one, 884_520);
    }

    #[test]
    fn test_household_beyond_fifth_pays_last_rate() {
        let five = calculate_actual_amount(OBJECT_HGD, 5, 6);
        let six = calculate_actual_amount(OBJECT_HGD, 6, 6);
        let seven = calculate_actual_amount(OBJECT_HGD, 7, 6);
        assert_eq!(six - five, seven - six);
        // 40% of base for 6 months
        assert_eq!(six - five, 252_720);
    }

    #[test]
    fn test_subsidized_groups() {
        assert_eq!(calculate_actual_amount(OBJECT_DTTS, 1, 12), 379_080);
        assert_eq!(calculate_actual_amount(OBJECT_NLN, 1, 12), 884_520);
        // participant_number does not matter outside households
        assert_eq!(
            calculate_actual_amount(OBJECT_DTTS, 3, 12),
            calculate_actual_amount(OBJECT_DTTS, 1, 12)
        );
    }

    #[test]
    fn test_unknown_and_degenerate_inputs_are_zero() {
        assert_eq!(calculate_actual_amount("XYZ", 1, 12), 0);
        assert_eq!(calculate_actual_amount(OBJECT_HGD, 0, 12), 0);
        assert_eq!(calculate_actual_amount(OBJECT_HGD, 1, 0), 0);
        assert_eq!(calculate_actual_amount(OBJECT_HGD, -1, 12), 0);
    }

    #[test]
    fn test_deterministic_and_non_negative() {
        for object_type in [OBJECT_HGD, OBJECT_DTTS, OBJECT_NLN, "other"] {
            for participant in 1..=8 {
                for months in [3, 6, 12] {
                    let a = calculate_actual_amount(object_type, participant, months);
                    let b = calculate_actual_amount(object_type, participant, months);
                    assert_eq!(a, b);
                    assert!(a >= 0);
                }
            }
        }
    }
}
