//! Input masks for the payment form.
//!
//! Every mask is a pure function of the raw text and is idempotent on its own
//! output, so the server can re-apply them to whatever the browser posted.

const CARD_DIGITS: usize = 16;
const EXPIRY_LEN: usize = 5;
const CVV_MAX: usize = 4;

/// Groups up to 16 digits in runs of four separated by single spaces.
/// Anything that is not an ASCII digit is dropped.
pub fn card_number(raw: &str) -> String {
    let mut out = String::with_capacity(CARD_DIGITS + 3);
    for (index, digit) in digits(raw).take(CARD_DIGITS).enumerate() {
        if index > 0 && index % 4 == 0 {
            out.push(' ');
        }
        out.push(digit);
    }
    out
}

/// `MM/YY` mask: the slash appears as soon as two digits are present.
pub fn expiry(raw: &str) -> String {
    let digits: String = digits(raw).take(4).collect();
    let mut out = if digits.len() >= 2 {
        format!("{}/{}", &digits[..2], &digits[2..])
    } else {
        digits
    };
    out.truncate(EXPIRY_LEN);
    out
}

pub fn cvv(raw: &str) -> String {
    digits(raw).take(CVV_MAX).collect()
}

/// Card number with the grouping spaces removed.
pub fn card_digits(formatted: &str) -> String {
    formatted.chars().filter(|c| !c.is_whitespace()).collect()
}

fn digits(raw: &str) -> impl Iterator<Item = char> + '_ {
    raw.chars().filter(char::is_ascii_digit)
}
