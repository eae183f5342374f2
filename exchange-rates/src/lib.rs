//! CLP/USD Exchange Rates
//!
//! Pure conversion and display formatting for the storefront's two currencies.
//! The exchange rate is quoted as "CLP per 1 USD", so USD is the base currency
//! and CLP the quote currency.
//!
//! Currencies are defined declaratively with a macro that generates the
//! `CurrencyCode` enum together with its locale metadata.
//!
//! # Example
//! ```
//! use exchange_rates::{convert, format_amount, CurrencyCode, Direction};
//!
//! let clp = convert(100.0, 850.0, Direction::BaseToQuote).unwrap();
//! assert_eq!(clp, 85_000.0);
//! assert_eq!(format_amount(clp, CurrencyCode::CLP), "$85.000 CLP");
//!
//! let usd = convert(85_000.0, 850.0, Direction::QuoteToBase).unwrap();
//! assert_eq!(format_amount(usd, CurrencyCode::USD), "US$100");
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Precondition failures of the converter.
///
/// These indicate a caller bug: the cache never hands out a non-positive rate.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum ConversionError {
    #[error("Exchange rate must be a positive finite number, got {0}")]
    NonPositiveRate(f64),

    #[error("Amount must be a finite number")]
    NonFiniteAmount,

    #[error("Amount {0} is outside the supported range of ±1e15")]
    AmountOutOfRange(f64),
}

// ─────────────────────────────────────────────────────────────────────────────
// THE MACRO: Defines all currencies and their display metadata
// ─────────────────────────────────────────────────────────────────────────────

/// Defines the `CurrencyCode` enum with locale display metadata.
///
/// # Syntax
/// ```ignore
/// define_currencies! {
///     Name => ("CODE", "prefix", "suffix", group_separator, decimal_separator, max_fraction_digits),
/// }
/// ```
macro_rules! define_currencies {
    (
        $(
            $name:ident => ($code:literal, $prefix:literal, $suffix:literal, $group:literal, $decimal:literal, $fraction:expr)
        ),* $(,)?
    ) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
        #[serde(rename_all = "UPPERCASE")]
        pub enum CurrencyCode {
            $($name),*
        }

        impl CurrencyCode {
            pub fn code(&self) -> &'static str {
                match self {
                    $(CurrencyCode::$name => $code),*
                }
            }

            /// Text placed before the number, e.g. `$` or `US$`.
            pub fn prefix(&self) -> &'static str {
                match self {
                    $(CurrencyCode::$name => $prefix),*
                }
            }

            /// Text placed after the number, e.g. ` CLP`.
            pub fn suffix(&self) -> &'static str {
                match self {
                    $(CurrencyCode::$name => $suffix),*
                }
            }

            pub fn group_separator(&self) -> char {
                match self {
                    $(CurrencyCode::$name => $group),*
                }
            }

            pub fn decimal_separator(&self) -> char {
                match self {
                    $(CurrencyCode::$name => $decimal),*
                }
            }

            /// Maximum number of fraction digits shown when formatting.
            pub fn fraction_digits(&self) -> u32 {
                match self {
                    $(CurrencyCode::$name => $fraction),*
                }
            }

            pub fn all() -> &'static [CurrencyCode] {
                &[$(CurrencyCode::$name),*]
            }
        }

        impl fmt::Display for CurrencyCode {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.code())
            }
        }

        impl FromStr for CurrencyCode {
            type Err = String;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_uppercase().as_str() {
                    $($code => Ok(CurrencyCode::$name),)*
                    _ => Err(format!("Unknown currency: {}", s)),
                }
            }
        }
    };
}

// ─────────────────────────────────────────────────────────────────────────────
// CURRENCY DEFINITIONS
// ─────────────────────────────────────────────────────────────────────────────

define_currencies! {
    CLP => ("CLP", "$", " CLP", '.', ',', 0),
    USD => ("USD", "US$", "", ',', '.', 2),
}

/// The currency the rate is quoted against (1 unit of base = `rate` units of quote).
pub const BASE: CurrencyCode = CurrencyCode::USD;

/// The currency catalog prices are stored in.
pub const QUOTE: CurrencyCode = CurrencyCode::CLP;

/// Rate used before the first successful refresh.
pub const DEFAULT_CLP_PER_USD: f64 = 850.0;

/// Largest magnitude accepted or produced by [`convert`]. Whole pesos and
/// cents stay exact in an `f64` below this.
pub const MAX_AMOUNT: f64 = 1e15;

// ─────────────────────────────────────────────────────────────────────────────
// Direction
// ─────────────────────────────────────────────────────────────────────────────

/// Conversion direction relative to the quoted rate.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Direction {
    /// USD → CLP, rounded to whole pesos.
    #[default]
    #[serde(rename = "usd-to-clp", alias = "USD_to_CLP")]
    BaseToQuote,
    /// CLP → USD, rounded to cents.
    #[serde(rename = "clp-to-usd", alias = "CLP_to_USD")]
    QuoteToBase,
}

impl Direction {
    pub fn source(&self) -> CurrencyCode {
        match self {
            Direction::BaseToQuote => BASE,
            Direction::QuoteToBase => QUOTE,
        }
    }

    pub fn target(&self) -> CurrencyCode {
        match self {
            Direction::BaseToQuote => QUOTE,
            Direction::QuoteToBase => BASE,
        }
    }

    pub fn flipped(&self) -> Self {
        match self {
            Direction::BaseToQuote => Direction::QuoteToBase,
            Direction::QuoteToBase => Direction::BaseToQuote,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::BaseToQuote => write!(f, "usd-to-clp"),
            Direction::QuoteToBase => write!(f, "clp-to-usd"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "usd-to-clp" | "base-to-quote" => Ok(Direction::BaseToQuote),
            "clp-to-usd" | "quote-to-base" => Ok(Direction::QuoteToBase),
            _ => Err(format!("Unknown direction: {}", s)),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Exchange Rate
// ─────────────────────────────────────────────────────────────────────────────

/// A validated CLP-per-USD rate and the time it was published.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRate {
    #[schema(example = 850.0)]
    rate: f64,
    #[schema(value_type = String, example = "2024-05-01T12:00:00Z")]
    updated_at: DateTime<Utc>,
}

impl ExchangeRate {
    /// Creates a rate, rejecting zero, negative and non-finite values.
    pub fn new(rate: f64, updated_at: DateTime<Utc>) -> Result<Self, ConversionError> {
        check_rate(rate)?;
        Ok(Self { rate, updated_at })
    }

    /// The built-in default rate, stamped with the current time.
    pub fn fallback() -> Self {
        Self {
            rate: DEFAULT_CLP_PER_USD,
            updated_at: Utc::now(),
        }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn convert(&self, amount: f64, direction: Direction) -> Result<f64, ConversionError> {
        convert(amount, self.rate, direction)
    }

    /// The "1 USD = $850 CLP" line shown next to the calculator.
    pub fn describe(&self) -> String {
        format!(
            "1 {} = {}{} {}",
            BASE.code(),
            QUOTE.prefix(),
            group_number(self.rate, 2, QUOTE.group_separator(), QUOTE.decimal_separator()),
            QUOTE.code()
        )
    }
}

impl fmt::Display for ExchangeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// Checks that `amount` is finite and within [`MAX_AMOUNT`].
pub fn check_amount(amount: f64) -> Result<(), ConversionError> {
    if !amount.is_finite() {
        return Err(ConversionError::NonFiniteAmount);
    }
    if amount.abs() > MAX_AMOUNT {
        return Err(ConversionError::AmountOutOfRange(amount));
    }
    Ok(())
}

fn check_rate(rate: f64) -> Result<(), ConversionError> {
    if rate.is_finite() && rate > 0.0 {
        Ok(())
    } else {
        Err(ConversionError::NonPositiveRate(rate))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Conversion
// ─────────────────────────────────────────────────────────────────────────────

/// Converts `amount` using a CLP-per-USD `rate`.
///
/// - `BaseToQuote`: `round(amount * rate)`, whole pesos.
/// - `QuoteToBase`: `round(amount / rate * 100) / 100`, cents.
///
/// Halves round towards positive infinity.
pub fn convert(amount: f64, rate: f64, direction: Direction) -> Result<f64, ConversionError> {
    check_rate(rate)?;
    check_amount(amount)?;

    let converted = match direction {
        Direction::BaseToQuote => round_half_up(amount * rate),
        Direction::QuoteToBase => round_half_up((amount / rate) * 100.0) / 100.0,
    };
    check_amount(converted)?;
    Ok(converted)
}

fn round_half_up(value: f64) -> f64 {
    let floor = value.floor();
    if value - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Formatting
// ─────────────────────────────────────────────────────────────────────────────

/// Formats an amount for display, e.g. `$159.990 CLP` or `US$1,234.5`.
///
/// Trailing fraction zeros are dropped. The input value is not modified.
pub fn format_amount(amount: f64, currency: CurrencyCode) -> String {
    let magnitude = group_number(
        amount,
        currency.fraction_digits(),
        currency.group_separator(),
        currency.decimal_separator(),
    );
    let negative = amount < 0.0 && magnitude.chars().any(|c| c.is_ascii_digit() && c != '0');
    format!(
        "{}{}{}{}",
        if negative { "-" } else { "" },
        currency.prefix(),
        magnitude,
        currency.suffix()
    )
}

/// Groups the magnitude of `value`; the sign is left to the caller.
fn group_number(value: f64, max_fraction: u32, group: char, decimal: char) -> String {
    let scale = 10u64.pow(max_fraction);
    let scaled = round_half_up(value.abs() * scale as f64);
    let (digits, fraction) = if scaled < u64::MAX as f64 {
        let scaled = scaled as u64;
        ((scaled / scale).to_string(), scaled % scale)
    } else {
        // Beyond u64: print the whole part from the float itself.
        (format!("{:.0}", value.abs().floor()), 0)
    };

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 4);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(group);
        }
        out.push(ch);
    }

    if fraction > 0 {
        let frac = format!("{:0width$}", fraction, width = max_fraction as usize);
        out.push(decimal);
        out.push_str(frac.trim_end_matches('0'));
    }
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_usd_to_clp() {
        assert_eq!(convert(100.0, 850.0, Direction::BaseToQuote).unwrap(), 85_000.0);
    }

    #[test]
    fn test_clp_to_usd() {
        assert_eq!(convert(85_000.0, 850.0, Direction::QuoteToBase).unwrap(), 100.0);
    }

    #[test]
    fn test_clp_to_usd_rounds_to_cents() {
        // 159990 / 850 = 188.2235...
        assert_eq!(convert(159_990.0, 850.0, Direction::QuoteToBase).unwrap(), 188.22);
    }

    #[test]
    fn test_half_rounds_up() {
        assert_eq!(convert(1.0, 2.5, Direction::BaseToQuote).unwrap(), 3.0);
        assert_eq!(convert(-1.0, 2.5, Direction::BaseToQuote).unwrap(), -2.0);
    }

    #[test]
    fn test_zero_rate_is_refused() {
        let result = convert(100.0, 0.0, Direction::QuoteToBase);
        assert!(matches!(result, Err(ConversionError::NonPositiveRate(_))));
    }

    #[test]
    fn test_negative_and_nan_rates_are_refused() {
        assert!(convert(100.0, -850.0, Direction::BaseToQuote).is_err());
        assert!(convert(100.0, f64::NAN, Direction::BaseToQuote).is_err());
        assert!(ExchangeRate::new(0.0, Utc::now()).is_err());
    }

    #[test]
    fn test_non_finite_amount_is_refused() {
        let result = convert(f64::INFINITY, 850.0, Direction::BaseToQuote);
        assert_eq!(result, Err(ConversionError::NonFiniteAmount));
    }

    #[test]
    fn test_amount_outside_range_is_refused() {
        assert_eq!(
            convert(1e30, 850.0, Direction::BaseToQuote),
            Err(ConversionError::AmountOutOfRange(1e30))
        );
        // The input fits but the pesos would not.
        assert!(matches!(
            convert(2e12, 850.0, Direction::BaseToQuote),
            Err(ConversionError::AmountOutOfRange(_))
        ));
        assert!(convert(MAX_AMOUNT, 850.0, Direction::QuoteToBase).is_ok());
    }

    #[test]
    fn test_format_huge_amount_keeps_magnitude() {
        let formatted = format_amount(1e30, CurrencyCode::CLP);
        let digits = formatted.chars().filter(|c| c.is_ascii_digit()).count();
        assert_eq!(digits, 31);
        assert!(formatted.starts_with("$1.000.000.000.000.000."));
        assert!(!formatted.contains("18.446"));
    }

    #[test]
    fn test_format_clp() {
        assert_eq!(format_amount(159_990.0, CurrencyCode::CLP), "$159.990 CLP");
        assert_eq!(format_amount(1_250_000.0, CurrencyCode::CLP), "$1.250.000 CLP");
        assert_eq!(format_amount(990.0, CurrencyCode::CLP), "$990 CLP");
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_amount(100.0, CurrencyCode::USD), "US$100");
        assert_eq!(format_amount(1234.5, CurrencyCode::USD), "US$1,234.5");
        assert_eq!(format_amount(188.22, CurrencyCode::USD), "US$188.22");
        assert_eq!(format_amount(0.07, CurrencyCode::USD), "US$0.07");
    }

    #[test]
    fn test_format_negative() {
        assert_eq!(format_amount(-1500.0, CurrencyCode::CLP), "-$1.500 CLP");
    }

    #[test]
    fn test_rate_line() {
        let rate = ExchangeRate::new(943.5, Utc::now()).unwrap();
        assert_eq!(rate.describe(), "1 USD = $943,5 CLP");
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!("usd-to-clp".parse::<Direction>().unwrap(), Direction::BaseToQuote);
        assert_eq!("CLP_to_USD".parse::<Direction>().unwrap(), Direction::QuoteToBase);
        assert!("eur-to-clp".parse::<Direction>().is_err());
    }

    #[test]
    fn test_direction_endpoints() {
        assert_eq!(Direction::BaseToQuote.source(), CurrencyCode::USD);
        assert_eq!(Direction::BaseToQuote.target(), CurrencyCode::CLP);
        assert_eq!(Direction::BaseToQuote.flipped(), Direction::QuoteToBase);
    }

    #[test]
    fn test_currency_code_parse() {
        assert_eq!("clp".parse::<CurrencyCode>().unwrap(), CurrencyCode::CLP);
        assert_eq!(CurrencyCode::USD.to_string(), "USD");
        assert_eq!(CurrencyCode::all().len(), 2);
    }

    proptest! {
        #[test]
        fn round_trip_within_rounding_error(cents in 0u64..100_000_000, rate in 1.0f64..5_000.0) {
            let usd = cents as f64 / 100.0;
            let clp = convert(usd, rate, Direction::BaseToQuote).unwrap();
            let back = convert(clp, rate, Direction::QuoteToBase).unwrap();
            // half a peso on the way in, half a cent on the way out
            let tolerance = 0.5 / rate + 0.005 + 1e-9 * usd.max(1.0);
            prop_assert!((back - usd).abs() <= tolerance, "{} -> {} -> {}", usd, clp, back);
        }

        #[test]
        fn clp_results_are_whole(amount in 0.0f64..1_000_000.0, rate in 1.0f64..5_000.0) {
            let clp = convert(amount, rate, Direction::BaseToQuote).unwrap();
            prop_assert_eq!(clp.fract(), 0.0);
        }
    }
}
