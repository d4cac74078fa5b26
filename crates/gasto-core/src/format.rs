use chrono::NaiveDate;
use gasto_domain::coerce_amount;

/// Formats currency amounts for presentation.
pub trait CurrencyFormatter: Send + Sync {
    fn format_amount(&self, amount: f64) -> String;

    /// Formats a possibly-missing amount; a missing value renders as zero.
    fn format_optional(&self, amount: Option<f64>) -> String {
        self.format_amount(amount.unwrap_or(0.0))
    }
}

/// Formats dates for presentation.
pub trait DateFormatter: Send + Sync {
    fn format_date(&self, date: NaiveDate) -> String;
}

/// Locale and currency conventions driving [`LocaleFormatter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyLocale {
    pub language_tag: String,
    pub currency_code: String,
    pub symbol: String,
    pub decimal_separator: char,
    pub grouping_separator: char,
    /// Whether a space separates the symbol from the digits (`$ 10,00` vs `$10.00`).
    pub symbol_spacing: bool,
    /// `chrono` strftime pattern for dates.
    pub date_pattern: String,
}

impl CurrencyLocale {
    /// Argentine Spanish, Argentine peso.
    pub fn es_ar() -> Self {
        Self {
            language_tag: "es-AR".into(),
            currency_code: "ARS".into(),
            symbol: "$".into(),
            decimal_separator: ',',
            grouping_separator: '.',
            symbol_spacing: true,
            date_pattern: "%d/%m/%Y".into(),
        }
    }

    /// Brazilian Portuguese, Brazilian real.
    pub fn pt_br() -> Self {
        Self {
            language_tag: "pt-BR".into(),
            currency_code: "BRL".into(),
            symbol: "R$".into(),
            decimal_separator: ',',
            grouping_separator: '.',
            symbol_spacing: true,
            date_pattern: "%d/%m/%Y".into(),
        }
    }

    pub fn en_us() -> Self {
        Self {
            language_tag: "en-US".into(),
            currency_code: "USD".into(),
            symbol: "$".into(),
            decimal_separator: '.',
            grouping_separator: ',',
            symbol_spacing: false,
            date_pattern: "%m/%d/%Y".into(),
        }
    }

    /// Looks up a preset by language tag (`es-AR`, `es_ar`, `pt-BR`, `en-US`).
    pub fn for_tag(tag: &str) -> Option<Self> {
        match tag.trim().replace('_', "-").to_ascii_lowercase().as_str() {
            "es-ar" | "es" => Some(Self::es_ar()),
            "pt-br" | "pt" => Some(Self::pt_br()),
            "en-us" | "en" => Some(Self::en_us()),
            _ => None,
        }
    }

    /// Swaps the currency while keeping separators and date conventions.
    pub fn with_currency(mut self, code: &str) -> Self {
        let code = code.trim().to_uppercase();
        if code.is_empty() {
            return self;
        }
        self.symbol = symbol_for(&code);
        self.currency_code = code;
        self
    }
}

impl Default for CurrencyLocale {
    fn default() -> Self {
        Self::es_ar()
    }
}

pub fn symbol_for(code: &str) -> String {
    match code {
        "USD" | "ARS" | "MXN" | "CLP" | "COP" => "$".into(),
        "BRL" => "R$".into(),
        "EUR" => "€".into(),
        "GBP" => "£".into(),
        "UYU" => "$U".into(),
        _ => code.into(),
    }
}

/// Formats amounts and dates according to a [`CurrencyLocale`].
#[derive(Debug, Clone, Default)]
pub struct LocaleFormatter {
    locale: CurrencyLocale,
}

impl LocaleFormatter {
    pub fn new(locale: CurrencyLocale) -> Self {
        Self { locale }
    }

    pub fn locale(&self) -> &CurrencyLocale {
        &self.locale
    }

    /// Grouped two-decimal number without the currency symbol.
    pub fn format_plain(&self, amount: f64) -> String {
        let value = coerce_amount(amount);
        let body = format_number(&self.locale, value.abs());
        if is_negative_cents(value) {
            format!("-{}", body)
        } else {
            body
        }
    }
}

impl CurrencyFormatter for LocaleFormatter {
    fn format_amount(&self, amount: f64) -> String {
        let value = coerce_amount(amount);
        let body = format_number(&self.locale, value.abs());
        let separator = if self.locale.symbol_spacing { " " } else { "" };
        let sign = if is_negative_cents(value) { "-" } else { "" };
        format!("{}{}{}{}", sign, self.locale.symbol, separator, body)
    }
}

impl DateFormatter for LocaleFormatter {
    fn format_date(&self, date: NaiveDate) -> String {
        date.format(&self.locale.date_pattern).to_string()
    }
}

fn is_negative_cents(value: f64) -> bool {
    (value * 100.0).round() < 0.0
}

fn format_number(locale: &CurrencyLocale, value: f64) -> String {
    let fixed = format!("{:.2}", value);
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    format!(
        "{}{}{}",
        group_digits(int_part, locale.grouping_separator),
        locale.decimal_separator,
        frac_part
    )
}

fn group_digits(digits: &str, separator: char) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (count, ch) in digits.chars().rev().enumerate() {
        if count != 0 && count % 3 == 0 {
            grouped.insert(0, separator);
        }
        grouped.insert(0, ch);
    }
    grouped
}
