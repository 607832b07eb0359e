//! Named analysis recipes.
//!
//! A recipe file is YAML holding the label table and a list of recipes. Each
//! recipe bundles charts (one per listed metric), comparison tables and
//! plain evaluations, and can be run on its own from the command line.
//!
//! Conditions are written as `[key, value]` pairs; a `max.` or `min.` key
//! prefix turns the pair into an inclusive upper or lower bound.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sweepplot_core::{
    Conditions, DomainSpec, Labels, Metric, Record, SeriesBuilder, SpecError, SplitSpec, Value,
    XAxis,
};

/// Recipes compiled into the binary, used when no file is given
pub const DEFAULT_RECIPES: &str = include_str!("../recipes/default.yaml");

#[derive(Debug)]
pub enum RecipeError {
    Io(std::io::Error),
    Yaml(serde_saphyr::Error),
    DuplicateName(String),
    UnknownRecipe(String),
    Empty { recipe: String },
    Spec { recipe: String, source: SpecError },
}

impl fmt::Display for RecipeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecipeError::Io(e) => write!(f, "failed to read recipe file: {e}"),
            RecipeError::Yaml(e) => write!(f, "invalid recipe file: {e}"),
            RecipeError::DuplicateName(name) => write!(f, "recipe '{name}' is defined twice"),
            RecipeError::UnknownRecipe(name) => write!(f, "no recipe named '{name}'"),
            RecipeError::Empty { recipe } => {
                write!(f, "recipe '{recipe}' has no charts, tables or evaluations")
            }
            RecipeError::Spec { recipe, source } => write!(f, "recipe '{recipe}': {source}"),
        }
    }
}

impl std::error::Error for RecipeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RecipeError::Io(e) => Some(e),
            RecipeError::Yaml(e) => Some(e),
            RecipeError::Spec { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RecipeError {
    fn from(err: std::io::Error) -> Self {
        RecipeError::Io(err)
    }
}

impl From<serde_saphyr::Error> for RecipeError {
    fn from(err: serde_saphyr::Error) -> Self {
        RecipeError::Yaml(err)
    }
}

/// Top-level recipe file
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RecipeFile {
    /// Display strings for parameter names, values and metric names
    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    /// Legend entry for a series with neither a label nor a split
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_label: Option<String>,

    #[serde(default)]
    pub recipes: Vec<RecipeData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeData {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub charts: Vec<ChartRecipe>,

    #[serde(default)]
    pub tables: Vec<TableRecipe>,

    #[serde(default)]
    pub evaluations: Vec<EvaluationRecipe>,
}

/// A chart family: one chart is drawn per entry of `metrics`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartRecipe {
    /// Distinguishes several charts of one recipe in output file names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default)]
    pub x: AxisData,

    pub metrics: Vec<Metric>,

    /// Conditions shared by every entry of `plots` (not by the extras)
    #[serde(default)]
    pub conditions: Conditions,

    pub plots: Vec<PlotData>,

    #[serde(default)]
    pub extra_lines: Vec<ExtraLineData>,

    #[serde(default)]
    pub extra_splits: Vec<ExtraSplitData>,
}

/// YAML form of [`XAxis`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AxisData {
    #[default]
    Categorical,
    Parameter,
    Metric {
        metric: Metric,
    },
}

impl AxisData {
    pub fn to_x_axis(self) -> XAxis {
        match self {
            AxisData::Categorical => XAxis::Categorical,
            AxisData::Parameter => XAxis::Parameter,
            AxisData::Metric { metric } => XAxis::Metric(metric),
        }
    }
}

/// A parameter name with its ordered values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuesData {
    pub name: String,
    pub values: Vec<Value>,
}

impl ValuesData {
    pub fn to_domain(&self, labels: &Labels) -> Result<DomainSpec, SpecError> {
        DomainSpec::new(self.name.clone(), self.values.iter().cloned(), labels)
    }

    pub fn to_split(&self, labels: &Labels) -> Result<SplitSpec, SpecError> {
        SplitSpec::new(self.name.clone(), self.values.iter().cloned(), labels)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotData {
    pub domain: ValuesData,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split: Option<ValuesData>,

    #[serde(default)]
    pub conditions: Conditions,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtraLineData {
    pub label: String,
    #[serde(default)]
    pub conditions: Conditions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtraSplitData {
    pub label: String,
    pub split: ValuesData,
    #[serde(default)]
    pub conditions: Conditions,
}

/// Rows of `label & value & value ...`, one per condition set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableRecipe {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    pub metrics: Vec<Metric>,

    /// Decimal places per metric column; missing entries default to 4
    #[serde(default)]
    pub decimals: Vec<usize>,

    #[serde(default)]
    pub conditions: Conditions,

    pub rows: Vec<TableRow>,
}

impl TableRecipe {
    pub const DEFAULT_DECIMALS: usize = 4;

    pub fn decimals_for(&self, column: usize) -> usize {
        self.decimals
            .get(column)
            .copied()
            .unwrap_or(Self::DEFAULT_DECIMALS)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableRow {
    pub label: String,
    pub conditions: Conditions,
}

/// Mean and standard error of metrics under one condition set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRecipe {
    /// Printed before the statistics; defaults to the conditions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,

    pub metrics: Vec<Metric>,

    #[serde(default)]
    pub conditions: Conditions,
}

impl RecipeFile {
    /// Parse and validate a recipe file
    pub fn from_yaml(yaml: &str) -> Result<Self, RecipeError> {
        let file: RecipeFile = serde_saphyr::from_str(yaml)?;
        file.validate()?;
        Ok(file)
    }

    pub fn load(path: &Path) -> Result<Self, RecipeError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    pub fn builtin() -> Result<Self, RecipeError> {
        Self::from_yaml(DEFAULT_RECIPES)
    }

    pub fn to_labels(&self) -> Labels {
        let mut labels: Labels = self.labels.iter().collect();
        if let Some(average) = &self.average_label {
            labels.set_average(average.clone());
        }
        labels
    }

    pub fn get(&self, name: &str) -> Result<&RecipeData, RecipeError> {
        self.recipes
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| RecipeError::UnknownRecipe(name.to_string()))
    }

    /// Check names are unique and every domain and split can be built
    pub fn validate(&self) -> Result<(), RecipeError> {
        let labels = self.to_labels();
        for (i, recipe) in self.recipes.iter().enumerate() {
            if self.recipes[..i].iter().any(|r| r.name == recipe.name) {
                return Err(RecipeError::DuplicateName(recipe.name.clone()));
            }
            recipe
                .validate(&labels)
                .map_err(|source| RecipeError::Spec {
                    recipe: recipe.name.clone(),
                    source,
                })?;
            if recipe.charts.is_empty() && recipe.tables.is_empty() && recipe.evaluations.is_empty()
            {
                return Err(RecipeError::Empty {
                    recipe: recipe.name.clone(),
                });
            }
        }
        Ok(())
    }
}

impl RecipeData {
    fn validate(&self, labels: &Labels) -> Result<(), SpecError> {
        for chart in &self.charts {
            if chart.plots.is_empty()
                && (!chart.extra_lines.is_empty() || !chart.extra_splits.is_empty())
            {
                return Err(SpecError::NoDomain);
            }
            for plot in &chart.plots {
                plot.domain.to_domain(labels)?;
                if let Some(split) = &plot.split {
                    split.to_split(labels)?;
                }
            }
            for extra in &chart.extra_splits {
                extra.split.to_split(labels)?;
            }
        }
        Ok(())
    }
}

impl ChartRecipe {
    /// Assemble the chart for one of this recipe's metrics
    pub fn builder<'a>(
        &self,
        records: &'a [Record],
        labels: &'a Labels,
        metric: Metric,
    ) -> Result<SeriesBuilder<'a>, SpecError> {
        let mut builder = SeriesBuilder::new(records, labels, self.x.to_x_axis(), metric);
        if let Some(title) = &self.title {
            builder = builder.with_title(title.clone());
        }

        for plot in &self.plots {
            let domain = plot.domain.to_domain(labels)?;
            let split = plot.split.as_ref().map(|s| s.to_split(labels)).transpose()?;
            let conditions = self.conditions.and(&plot.conditions);
            builder.plot(&domain, &conditions, split.as_ref(), plot.label.as_deref());
        }
        for extra in &self.extra_lines {
            builder.extra_line(&extra.label, &extra.conditions)?;
        }
        for extra in &self.extra_splits {
            let split = extra.split.to_split(labels)?;
            builder.extra_split(&extra.label, &split, &extra.conditions)?;
        }
        Ok(builder)
    }

    /// Output file stem for one metric of this chart
    pub fn file_stem(&self, recipe: &str, metric: Metric) -> String {
        match &self.name {
            Some(name) => format!("{recipe}-{name}-{metric}"),
            None => format!("{recipe}-{metric}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sweepplot_core::{Condition, Metrics, Params};

    const SMALL: &str = r##"
labels:
  samples_n: "# Samples"
  "true": CFB
  "false": Normal
average_label: Mean
recipes:
  - name: eudm-samples
    description: EUDM by sample count
    charts:
      - metrics: [cost, cost.safety]
        conditions: [[method, eudm], [max.rng_seed, 2047]]
        plots:
          - domain: { name: samples_n, values: [2, 4] }
            split: { name: use_cfb, values: ["false", "true"] }
        extra_lines:
          - label: MPDM
            conditions: [[method, mpdm]]
  - name: summary
    tables:
      - metrics: [cost, safety]
        decimals: [0, 4]
        rows:
          - label: Fixed
            conditions: [[method, fixed]]
"##;

    fn record(token: &str, cost: f64) -> Record {
        Record::new(
            Params::parse(token).unwrap(),
            Metrics::from_fields(&[cost, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.1]).unwrap(),
        )
    }

    #[test]
    fn test_parse_recipe_file() {
        let file = RecipeFile::from_yaml(SMALL).unwrap();
        assert_eq!(file.recipes.len(), 2);

        let labels = file.to_labels();
        assert_eq!(labels.label("samples_n"), "# Samples");
        assert_eq!(labels.average(), "Mean");

        let recipe = file.get("eudm-samples").unwrap();
        let chart = &recipe.charts[0];
        assert_eq!(chart.metrics, vec![Metric::Cost, Metric::CostSafety]);
        assert_eq!(chart.x, AxisData::Categorical);
        assert_eq!(
            chart.conditions,
            Conditions::new()
                .with(Condition::equals("method", "eudm"))
                .with(Condition::at_most("rng_seed", 2047.0))
        );

        let table = &file.get("summary").unwrap().tables[0];
        assert_eq!(table.decimals_for(0), 0);
        assert_eq!(table.decimals_for(5), TableRecipe::DEFAULT_DECIMALS);
    }

    #[test]
    fn test_unknown_recipe() {
        let file = RecipeFile::from_yaml(SMALL).unwrap();
        assert!(matches!(
            file.get("nope"),
            Err(RecipeError::UnknownRecipe(name)) if name == "nope"
        ));
    }

    #[test]
    fn test_duplicate_domain_values_rejected() {
        let yaml = r##"
recipes:
  - name: bad
    charts:
      - metrics: [cost]
        plots:
          - domain: { name: samples_n, values: [2, 2] }
"##;
        assert!(matches!(
            RecipeFile::from_yaml(yaml),
            Err(RecipeError::Spec { source: SpecError::DuplicateValue { .. }, .. })
        ));
    }

    #[test]
    fn test_duplicate_recipe_names_rejected() {
        let yaml = r##"
recipes:
  - name: twice
    evaluations: [{ metrics: [cost] }]
  - name: twice
    evaluations: [{ metrics: [cost] }]
"##;
        assert!(matches!(
            RecipeFile::from_yaml(yaml),
            Err(RecipeError::DuplicateName(name)) if name == "twice"
        ));
    }

    #[test]
    fn test_unknown_metric_rejected() {
        let yaml = r##"
recipes:
  - name: bad
    evaluations: [{ metrics: [seconds] }]
"##;
        assert!(matches!(RecipeFile::from_yaml(yaml), Err(RecipeError::Yaml(_))));
    }

    #[test]
    fn test_builder_applies_shared_conditions() {
        let file = RecipeFile::from_yaml(SMALL).unwrap();
        let labels = file.to_labels();
        let records = vec![
            record("method=eudm,use_cfb=false,eudm.samples_n=2,rng_seed=1", 4.0),
            record("method=eudm,use_cfb=false,eudm.samples_n=2,rng_seed=4000", 400.0),
            record("method=eudm,use_cfb=true,eudm.samples_n=4,rng_seed=1", 6.0),
            record("method=mpdm,use_cfb=false,mpdm.samples_n=2,rng_seed=1", 8.0),
        ];

        let chart_recipe = &file.get("eudm-samples").unwrap().charts[0];
        let chart = chart_recipe
            .builder(&records, &labels, Metric::Cost)
            .unwrap()
            .finish();

        let legends: Vec<&str> = chart.series.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(legends, vec!["Normal", "CFB", "MPDM"]);
        assert_eq!(chart.series[0].points[0].as_ref().map(|p| p.y), Some(4.0));
        assert_eq!(chart.series[1].points[1].as_ref().map(|p| p.y), Some(6.0));
        assert_eq!(chart.series[2].points[0].as_ref().map(|p| p.y), Some(8.0));
        assert_eq!(chart.x_label, "# Samples");

        assert_eq!(
            chart_recipe.file_stem("eudm-samples", Metric::CostSafety),
            "eudm-samples-cost.safety"
        );
    }

    #[test]
    fn test_builtin_recipes_are_valid() {
        let file = RecipeFile::builtin().unwrap();
        assert!(!file.recipes.is_empty());
        assert_eq!(file.to_labels().label("mcts"), "PTDM");
        assert_eq!(file.to_labels().average(), "Average");
    }
}
