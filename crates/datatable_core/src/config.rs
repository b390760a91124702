use std::collections::HashMap;
use std::sync::LazyLock;

use datatable_error::{DataTableError, Result};
use serde::{Deserialize, Serialize};

use crate::format::FormatOptions;
use crate::table::JoinType;
use crate::value::Value;

pub const DEFAULT_PIVOT_FIELD_HEADER: &str = "Field";
pub const DEFAULT_PIVOT_ROW_PREFIX: &str = "Row";
pub const DEFAULT_DIFF_COUNT_WIDTH: usize = 12;

/// Presentation and naming knobs used by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub null_display: String,
    pub empty_string_display: String,
    pub pivot_field_header: String,
    pub pivot_row_prefix: String,
    pub default_join_type: JoinType,
    pub diff_count_width: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            null_display: FormatOptions::new().null.to_string(),
            empty_string_display: FormatOptions::new().empty_string.to_string(),
            pivot_field_header: DEFAULT_PIVOT_FIELD_HEADER.to_string(),
            pivot_row_prefix: DEFAULT_PIVOT_ROW_PREFIX.to_string(),
            default_join_type: JoinType::default(),
            diff_count_width: DEFAULT_DIFF_COUNT_WIDTH,
        }
    }
}

impl EngineConfig {
    /// Load a config from json. Missing keys take their default values.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn format_options(&self) -> FormatOptions<'_> {
        FormatOptions {
            null: &self.null_display,
            empty_string: &self.empty_string_display,
        }
    }

    pub fn set_from_value(&mut self, name: &str, value: Value) -> Result<()> {
        let func = GET_SET_FUNCTIONS
            .get(name)
            .ok_or_else(|| DataTableError::missing_field(name))?;

        (func.set)(value, self)
    }

    pub fn get_as_value(&self, name: &str) -> Result<Value> {
        let func = GET_SET_FUNCTIONS
            .get(name)
            .ok_or_else(|| DataTableError::missing_field(name))?;

        Ok((func.get)(self))
    }

    pub fn reset(&mut self, name: &str) -> Result<()> {
        let def_conf = Self::default();

        let func = GET_SET_FUNCTIONS
            .get(name)
            .ok_or_else(|| DataTableError::missing_field(name))?;

        let value = (func.get)(&def_conf);
        (func.set)(value, self)
    }

    pub fn reset_all(&mut self) {
        *self = Self::default();
    }

    /// Names of all settings, sorted.
    pub fn setting_names() -> Vec<&'static str> {
        let mut names: Vec<_> = GET_SET_FUNCTIONS.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

struct SettingFunctions {
    set: fn(value: Value, conf: &mut EngineConfig) -> Result<()>,
    get: fn(conf: &EngineConfig) -> Value,
}

impl SettingFunctions {
    const fn new<S: EngineSetting>() -> Self {
        SettingFunctions {
            set: S::set_from_value as _,
            get: S::get_as_value as _,
        }
    }
}

fn insert_setting<S: EngineSetting>(map: &mut HashMap<&'static str, SettingFunctions>) {
    if map.insert(S::NAME, SettingFunctions::new::<S>()).is_some() {
        panic!("Duplicate settings names: {}", S::NAME);
    }
}

static GET_SET_FUNCTIONS: LazyLock<HashMap<&'static str, SettingFunctions>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    insert_setting::<NullDisplay>(&mut map);
    insert_setting::<EmptyStringDisplay>(&mut map);
    insert_setting::<PivotFieldHeader>(&mut map);
    insert_setting::<PivotRowPrefix>(&mut map);
    insert_setting::<DefaultJoinType>(&mut map);
    insert_setting::<DiffCountWidth>(&mut map);

    map
});

pub trait EngineSetting: Sync + Send + 'static {
    const NAME: &'static str;
    const DESCRIPTION: &'static str;

    fn set_from_value(value: Value, conf: &mut EngineConfig) -> Result<()>;
    fn get_as_value(conf: &EngineConfig) -> Value;
}

fn expect_text(name: &str, value: Value) -> Result<String> {
    match value {
        Value::Text(s) => Ok(s),
        other => Err(DataTableError::type_mismatch(format!(
            "setting '{name}' expects text, got {}",
            other.type_name()
        ))),
    }
}

fn expect_non_empty_text(name: &str, value: Value) -> Result<String> {
    let s = expect_text(name, value)?;
    if s.is_empty() {
        return Err(DataTableError::type_mismatch(format!(
            "setting '{name}' cannot be empty"
        )));
    }
    Ok(s)
}

pub struct NullDisplay;

impl EngineSetting for NullDisplay {
    const NAME: &'static str = "null_display";
    const DESCRIPTION: &'static str = "Text printed for null values";

    fn set_from_value(value: Value, conf: &mut EngineConfig) -> Result<()> {
        conf.null_display = expect_text(Self::NAME, value)?;
        Ok(())
    }

    fn get_as_value(conf: &EngineConfig) -> Value {
        conf.null_display.clone().into()
    }
}

pub struct EmptyStringDisplay;

impl EngineSetting for EmptyStringDisplay {
    const NAME: &'static str = "empty_string_display";
    const DESCRIPTION: &'static str = "Text printed for empty text values";

    fn set_from_value(value: Value, conf: &mut EngineConfig) -> Result<()> {
        conf.empty_string_display = expect_text(Self::NAME, value)?;
        Ok(())
    }

    fn get_as_value(conf: &EngineConfig) -> Value {
        conf.empty_string_display.clone().into()
    }
}

pub struct PivotFieldHeader;

impl EngineSetting for PivotFieldHeader {
    const NAME: &'static str = "pivot_field_header";
    const DESCRIPTION: &'static str = "Header of the column holding original header names after a pivot";

    fn set_from_value(value: Value, conf: &mut EngineConfig) -> Result<()> {
        conf.pivot_field_header = expect_non_empty_text(Self::NAME, value)?;
        Ok(())
    }

    fn get_as_value(conf: &EngineConfig) -> Value {
        conf.pivot_field_header.clone().into()
    }
}

pub struct PivotRowPrefix;

impl EngineSetting for PivotRowPrefix {
    const NAME: &'static str = "pivot_row_prefix";
    const DESCRIPTION: &'static str = "Prefix for generated row identifiers when pivoting";

    fn set_from_value(value: Value, conf: &mut EngineConfig) -> Result<()> {
        conf.pivot_row_prefix = expect_text(Self::NAME, value)?;
        Ok(())
    }

    fn get_as_value(conf: &EngineConfig) -> Value {
        conf.pivot_row_prefix.clone().into()
    }
}

pub struct DefaultJoinType;

impl EngineSetting for DefaultJoinType {
    const NAME: &'static str = "default_join_type";
    const DESCRIPTION: &'static str = "Join type used when none is given (INNER, LEFT, RIGHT, FULL)";

    fn set_from_value(value: Value, conf: &mut EngineConfig) -> Result<()> {
        let s = expect_text(Self::NAME, value)?;
        conf.default_join_type = s.parse()?;
        Ok(())
    }

    fn get_as_value(conf: &EngineConfig) -> Value {
        conf.default_join_type.to_string().into()
    }
}

const MIN_DIFF_COUNT_WIDTH: i64 = 1;
const MAX_DIFF_COUNT_WIDTH: i64 = 64;

pub struct DiffCountWidth;

impl EngineSetting for DiffCountWidth {
    const NAME: &'static str = "diff_count_width";
    const DESCRIPTION: &'static str = "Column width of row counts in diff reports";

    fn set_from_value(value: Value, conf: &mut EngineConfig) -> Result<()> {
        let val = value.as_i64().ok_or_else(|| {
            DataTableError::type_mismatch(format!(
                "setting '{}' expects an int, got {}",
                Self::NAME,
                value.type_name()
            ))
        })?;
        if !(MIN_DIFF_COUNT_WIDTH..=MAX_DIFF_COUNT_WIDTH).contains(&val) {
            return Err(DataTableError::type_mismatch(format!(
                "Diff count width must be between {MIN_DIFF_COUNT_WIDTH} and {MAX_DIFF_COUNT_WIDTH}"
            )));
        }
        conf.diff_count_width = val as usize;
        Ok(())
    }

    fn get_as_value(conf: &EngineConfig) -> Value {
        conf.diff_count_width.into()
    }
}
