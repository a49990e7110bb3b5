//! Currency strings to milliunits.
//!
//! Accepted shapes (whitespace ignored):
//!   -12.34   $-12.34   -$1,234.5   ($1,234.56)   +7   0.125

use anyhow::{Result, bail};
use regex::Regex;
use rewardly_core::MILLIUNITS_PER_DOLLAR;

pub struct AmountParser {
    re: Regex,
}

impl AmountParser {
    pub fn new() -> Result<Self> {
        let re = Regex::new(concat!(
            r"^(?P<lead>[-+])?\$?(?P<inner>[-+])?",
            r"(?P<int>\d{1,3}(?:,\d{3})+|\d+)",
            r"(?:\.(?P<frac>\d{1,3}))?$"
        ))?;
        Ok(Self { re })
    }

    /// Parse a dollar amount into signed milliunits. Parentheses mean negative.
    pub fn to_milliunits(&self, text: &str) -> Result<i64> {
        let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();

        let (body, parenthesized) = match compact
            .strip_prefix('(')
            .and_then(|s| s.strip_suffix(')'))
        {
            Some(inner) => (inner, true),
            None => (compact.as_str(), false),
        };

        let Some(caps) = self.re.captures(body) else {
            bail!("unrecognized amount '{text}'");
        };

        let signs = [caps.name("lead"), caps.name("inner")];
        let minus_count = signs
            .iter()
            .flatten()
            .filter(|m| m.as_str() == "-")
            .count();
        if signs.iter().flatten().count() > 1 {
            bail!("amount '{text}' has more than one sign");
        }

        let whole: i64 = caps["int"]
            .replace(',', "")
            .parse()
            .map_err(|e| anyhow::anyhow!("amount '{text}' out of range: {e}"))?;
        let frac: i64 = match caps.name("frac") {
            Some(f) => format!("{:0<3}", f.as_str()).parse()?,
            None => 0,
        };

        let magnitude = whole
            .checked_mul(MILLIUNITS_PER_DOLLAR)
            .and_then(|m| m.checked_add(frac))
            .ok_or_else(|| anyhow::anyhow!("amount '{text}' out of range"))?;

        let negative = (minus_count == 1) ^ parenthesized;
        Ok(if negative { -magnitude } else { magnitude })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_common_shapes() {
        let p = AmountParser::new().unwrap();
        assert_eq!(p.to_milliunits("-12.34").unwrap(), -12_340);
        assert_eq!(p.to_milliunits("$-12.34").unwrap(), -12_340);
        assert_eq!(p.to_milliunits("-$1,234.5").unwrap(), -1_234_500);
        assert_eq!(p.to_milliunits("($1,234.56)").unwrap(), -1_234_560);
        assert_eq!(p.to_milliunits("+7").unwrap(), 7_000);
        assert_eq!(p.to_milliunits(" 0.125 ").unwrap(), 125);
        assert_eq!(p.to_milliunits("1234").unwrap(), 1_234_000);
    }

    #[test]
    fn test_rejects_garbage() {
        let p = AmountParser::new().unwrap();
        assert!(p.to_milliunits("").is_err());
        assert!(p.to_milliunits("abc").is_err());
        assert!(p.to_milliunits("1.2345").is_err());
        assert!(p.to_milliunits("--5").is_err());
        assert!(p.to_milliunits("12,34").is_err());
    }
}
