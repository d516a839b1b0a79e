use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
#[error("invalid ISO-8601 duration {value:?}: {reason}")]
pub struct InvalidDuration {
    pub value: String,
    pub reason: &'static str,
}

const DATE_UNITS: &[(char, i64)] = &[('W', 604_800), ('D', 86_400)];
const TIME_UNITS: &[(char, i64)] = &[('H', 3_600), ('M', 60), ('S', 1)];

/// Fractions are kept exactly, as numerators over `10^FRACTION_DIGITS`.
const FRACTION_DIGITS: u32 = 30;
const FRACTION_ONE: u128 = 10u128.pow(FRACTION_DIGITS);

/// Seconds as a whole part plus an exact fractional numerator.
#[derive(Debug, Default, Clone, Copy)]
struct Seconds {
    whole: i64,
    fraction: u128,
}

/// Convert an ISO-8601 duration such as `PT1H2M3S` into whole seconds.
///
/// Fractions are truncated, never rounded: `PT1M30.9S` is 90. Year and month
/// designators are rejected since their length in seconds is not fixed.
pub fn parse_iso8601_seconds(value: &str) -> Result<i64, InvalidDuration> {
    let invalid = |reason| InvalidDuration {
        value: value.to_string(),
        reason,
    };

    let rest = value
        .strip_prefix('P')
        .ok_or_else(|| invalid("missing leading 'P'"))?;
    if rest.is_empty() {
        return Err(invalid("no components"));
    }

    let (date_part, time_part) = match rest.split_once('T') {
        Some((_, "")) => return Err(invalid("empty time section")),
        Some((date, time)) => (date, Some(time)),
        None => (rest, None),
    };

    let mut total = Seconds::default();
    sum_components(date_part, DATE_UNITS, &mut total).map_err(invalid)?;
    if let Some(time) = time_part {
        sum_components(time, TIME_UNITS, &mut total).map_err(invalid)?;
    }

    i64::try_from(total.fraction / FRACTION_ONE)
        .ok()
        .and_then(|carry| total.whole.checked_add(carry))
        .ok_or_else(|| invalid("duration too large"))
}

/// Add `<number><designator>` pairs to `total`; designators must appear in
/// `units` order.
fn sum_components(
    section: &str,
    units: &[(char, i64)],
    total: &mut Seconds,
) -> Result<(), &'static str> {
    let mut number = String::new();
    let mut next_unit = 0;

    for c in section.chars() {
        if c.is_ascii_digit() || c == '.' || c == ',' {
            number.push(if c == ',' { '.' } else { c });
            continue;
        }

        let offset = units[next_unit..]
            .iter()
            .position(|(designator, _)| *designator == c)
            .ok_or(if c == 'Y' || (c == 'M' && units == DATE_UNITS) {
                "year and month components are not supported"
            } else {
                "unexpected or out-of-order designator"
            })?;
        if number.is_empty() {
            return Err("designator without a number");
        }
        let unit = units[next_unit + offset].1;
        let (whole, fraction) = split_number(&number)?;

        total.whole = whole
            .checked_mul(unit)
            .and_then(|secs| total.whole.checked_add(secs))
            .ok_or("duration too large")?;
        total.fraction += fraction * unit as u128;

        next_unit += offset + 1;
        number.clear();
    }

    if !number.is_empty() {
        return Err("number without a designator");
    }
    Ok(())
}

/// Split `12.345` into `12` and `345 * 10^(FRACTION_DIGITS - 3)`.
fn split_number(number: &str) -> Result<(i64, u128), &'static str> {
    let (int_part, frac_part) = match number.split_once('.') {
        Some((_, "")) => return Err("malformed number"),
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (number, ""),
    };
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if int_part.is_empty() || !all_digits(int_part) || !all_digits(frac_part) {
        return Err("malformed number");
    }
    if frac_part.len() > FRACTION_DIGITS as usize {
        return Err("too many fractional digits");
    }

    let whole: i64 = int_part.parse().map_err(|_| "duration too large")?;
    let fraction = if frac_part.is_empty() {
        0
    } else {
        let digits: u128 = frac_part.parse().map_err(|_| "malformed number")?;
        digits * 10u128.pow(FRACTION_DIGITS - frac_part.len() as u32)
    };
    Ok((whole, fraction))
}
