//! Number formatting used in every rendered document.

/// Format a currency amount with two decimals
pub fn format_amount(value: f64) -> String {
    format!("{:.2}", normalize_zero(value))
}

/// Format a quantity with up to three decimals, trailing zeros trimmed
pub fn format_quantity(value: f64) -> String {
    let text = format!("{:.3}", normalize_zero(value));
    let trimmed = text.trim_end_matches('0').trim_end_matches('.');
    trimmed.to_string()
}

/// Format a percentage with two decimals and a trailing `%`
pub fn format_percent(value: f64) -> String {
    format!("{:.2}%", normalize_zero(value))
}

// Avoid printing "-0.00" for tiny negative rounding residue.
fn normalize_zero(value: f64) -> f64 {
    if value.abs() < 0.0005 {
        0.0
    } else {
        value
    }
}

const ONES: [&str; 20] = [
    "", "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine", "Ten", "Eleven",
    "Twelve", "Thirteen", "Fourteen", "Fifteen", "Sixteen", "Seventeen", "Eighteen", "Nineteen",
];

const TENS: [&str; 10] = [
    "", "", "Twenty", "Thirty", "Forty", "Fifty", "Sixty", "Seventy", "Eighty", "Ninety",
];

/// Spell an amount in words using the lakh/crore grouping of the bills
///
/// Paise are rounded to the nearest whole paisa.
pub fn amount_in_words(value: f64) -> String {
    let negative = value < 0.0;
    let total_paise = (value.abs() * 100.0).round() as u64;
    let rupees = total_paise / 100;
    let paise = total_paise % 100;

    let mut words = if rupees == 0 {
        "Zero".to_string()
    } else {
        spell_indian(rupees)
    };
    words.insert_str(0, "Rupees ");
    if paise > 0 {
        words.push_str(" and ");
        words.push_str(&below_hundred(paise));
        words.push_str(" Paise");
    }
    words.push_str(" Only");
    if negative {
        words.insert_str(0, "Minus ");
    }
    words
}

fn spell_indian(mut n: u64) -> String {
    let mut parts = Vec::new();
    let crore = n / 10_000_000;
    n %= 10_000_000;
    if crore > 0 {
        // crores above 99 recurse so "One Hundred Crore" reads naturally
        parts.push(format!("{} Crore", spell_indian(crore)));
    }
    let lakh = n / 100_000;
    n %= 100_000;
    if lakh > 0 {
        parts.push(format!("{} Lakh", below_hundred(lakh)));
    }
    let thousand = n / 1000;
    n %= 1000;
    if thousand > 0 {
        parts.push(format!("{} Thousand", below_hundred(thousand)));
    }
    let hundred = n / 100;
    n %= 100;
    if hundred > 0 {
        parts.push(format!("{} Hundred", ONES[hundred as usize]));
    }
    if n > 0 {
        parts.push(below_hundred(n));
    }
    parts.join(" ")
}

fn below_hundred(n: u64) -> String {
    if n < 20 {
        ONES[n as usize].to_string()
    } else if n % 10 == 0 {
        TENS[(n / 10) as usize].to_string()
    } else {
        format!("{} {}", TENS[(n / 10) as usize], ONES[(n % 10) as usize])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(1234.5), "1234.50");
        assert_eq!(format_amount(-0.0001), "0.00");
        assert_eq!(format_amount(2.5 * 4.0), "10.00");
    }

    #[test]
    fn test_format_quantity() {
        assert_eq!(format_quantity(10.0), "10");
        assert_eq!(format_quantity(12.5), "12.5");
        assert_eq!(format_quantity(0.1234), "0.123");
        assert_eq!(format_quantity(0.0), "0");
    }

    #[test]
    fn test_amount_in_words() {
        assert_eq!(amount_in_words(0.0), "Rupees Zero Only");
        assert_eq!(amount_in_words(15.0), "Rupees Fifteen Only");
        assert_eq!(
            amount_in_words(125_430.50),
            "Rupees One Lakh Twenty Five Thousand Four Hundred Thirty and Fifty Paise Only"
        );
        assert_eq!(
            amount_in_words(20_000_000.0),
            "Rupees Two Crore Only"
        );
    }
}
