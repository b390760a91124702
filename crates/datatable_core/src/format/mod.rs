pub mod fixed_width;

use std::fmt;

use crate::value::Value;

/// Formatting options for values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOptions<'a> {
    /// String to use for printing null values.
    pub null: &'a str,

    /// String to use when a text value is empty.
    pub empty_string: &'a str,
}

impl FormatOptions<'_> {
    pub const fn new() -> Self {
        FormatOptions {
            null: "NULL",
            empty_string: "",
        }
    }
}

impl Default for FormatOptions<'_> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct Formatter<'a> {
    options: FormatOptions<'a>,
}

impl<'a> Formatter<'a> {
    pub const fn new(options: FormatOptions<'a>) -> Self {
        Formatter { options }
    }

    pub fn options(&self) -> &FormatOptions<'a> {
        &self.options
    }

    pub fn format_value<'b>(&self, value: &'b Value) -> FormattedValue<'_, 'b> {
        FormattedValue {
            options: &self.options,
            value,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FormattedValue<'a, 'b> {
    options: &'a FormatOptions<'a>,
    value: &'b Value,
}

impl FormattedValue<'_, '_> {
    fn nested<'c>(&self, value: &'c Value) -> FormattedValue<'_, 'c> {
        FormattedValue {
            options: self.options,
            value,
        }
    }
}

impl fmt::Display for FormattedValue<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Value::Null => write!(f, "{}", self.options.null),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            // Debug keeps the trailing ".0" on whole floats.
            Value::Float(v) => write!(f, "{v:?}"),
            Value::Text(v) => {
                if v.is_empty() {
                    write!(f, "{}", self.options.empty_string)
                } else {
                    write!(f, "{v}")
                }
            }
            Value::List(values) => {
                write!(f, "[")?;
                for (idx, v) in values.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", self.nested(v))?;
                }
                write!(f, "]")
            }
            Value::Record(row) => {
                write!(f, "{{")?;
                for (idx, (k, v)) in row.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {}", self.nested(v))?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;

    #[test]
    fn basic_values() {
        // (input, formatted output)
        let test_cases = [
            (Value::Null, "NULL"),
            (Value::from(8), "8"),
            (Value::from(2.25), "2.25"),
            (Value::from("hello"), "hello"),
            (Value::from(""), ""),
            (Value::Record(row! { "a" => 1, "b" => Value::Null }), "{a: 1, b: NULL}"),
        ];

        for (value, expected) in test_cases {
            let out = Formatter::new(FormatOptions::new())
                .format_value(&value)
                .to_string();
            assert_eq!(expected, out);
        }
    }

    #[test]
    fn null_formatting() {
        let opts = FormatOptions {
            null: "None",
            empty_string: "''",
        };
        let formatter = Formatter::new(opts);

        assert_eq!("None", formatter.format_value(&Value::Null).to_string());
        assert_eq!("''", formatter.format_value(&Value::from("")).to_string());
        assert_eq!(
            "[None, x]",
            formatter
                .format_value(&Value::List(vec![Value::Null, "x".into()]))
                .to_string()
        );
    }
}
