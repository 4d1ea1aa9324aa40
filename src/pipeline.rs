//! The fixed transform sequence from records to a box tree.
//!
//! build → prune → aggregate → impute sizes → names → collapse long paths →
//! collapse root → impute heat → normalize heat (optional) → boxes.

use crate::config::{ColorConfig, Config};
use crate::error::Result;
use crate::input::{self, DuplicatePolicy, InputFormat, Record};
use crate::render::{
    ColorMode, Colorer, HeatColorer, NoneColorer, TreeHueColorer, UIBox, UITreeMapBuilder,
};
use crate::tree::filter::{self, SuffixMatcher};
use crate::tree::impute::{SumSizeImputer, WeightedHeatImputer};
use crate::tree::{build_tree, Tree};

/// Points in the pipeline at which the observer sees the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Built,
    Pruned,
    Aggregated,
    SizesImputed,
    Named,
    PathsCollapsed,
    RootCollapsed,
    HeatImputed,
    HeatNormalized,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Built => "built",
            Stage::Pruned => "pruned",
            Stage::Aggregated => "aggregated",
            Stage::SizesImputed => "sizes-imputed",
            Stage::Named => "named",
            Stage::PathsCollapsed => "paths-collapsed",
            Stage::RootCollapsed => "root-collapsed",
            Stage::HeatImputed => "heat-imputed",
            Stage::HeatNormalized => "heat-normalized",
        }
    }
}

/// Callback invoked after each stage with the tree as it stands.
pub trait PipelineObserver {
    fn on_stage(&mut self, stage: Stage, tree: &Tree);
}

impl<F: FnMut(Stage, &Tree)> PipelineObserver for F {
    fn on_stage(&mut self, stage: Stage, tree: &Tree) {
        self(stage, tree)
    }
}

fn notify(observer: &mut Option<&mut dyn PipelineObserver>, stage: Stage, tree: &Tree) {
    tracing::trace!("Stage {}: {} nodes", stage.name(), tree.len());
    if let Some(obs) = observer.as_deref_mut() {
        obs.on_stage(stage, tree);
    }
}

/// Build a tree from records and run every configured transform on it.
/// Stages disabled in `config` are skipped and not reported.
pub fn prepare_tree(
    records: &[Record],
    policy: DuplicatePolicy,
    config: &Config,
    mut observer: Option<&mut dyn PipelineObserver>,
) -> Result<Tree> {
    let mut tree = build_tree(records, policy)?;
    notify(&mut observer, Stage::Built, &tree);

    let filters = &config.filters;
    let prune = SuffixMatcher::new(filters.prune_suffixes.iter().cloned());
    if !prune.is_empty() {
        filter::prune_by_suffix(&mut tree, &prune);
        notify(&mut observer, Stage::Pruned, &tree);
    }
    let aggregate = SuffixMatcher::new(filters.aggregate_suffixes.iter().cloned());
    if !aggregate.is_empty() {
        filter::aggregate_by_suffix(&mut tree, &aggregate);
        notify(&mut observer, Stage::Aggregated, &tree);
    }

    SumSizeImputer {
        empty_leaf_size: config.impute.empty_leaf_size,
    }
    .impute_size(&mut tree);
    notify(&mut observer, Stage::SizesImputed, &tree);

    tree.set_names_from_paths();
    notify(&mut observer, Stage::Named, &tree);

    if filters.collapse_long_paths {
        filter::collapse_long_paths(&mut tree);
        notify(&mut observer, Stage::PathsCollapsed, &tree);
    }
    if filters.collapse_root {
        filter::collapse_root(&mut tree);
        notify(&mut observer, Stage::RootCollapsed, &tree);
    }

    WeightedHeatImputer {
        empty_leaf_heat: config.impute.empty_leaf_heat,
    }
    .impute_heat(&mut tree);
    notify(&mut observer, Stage::HeatImputed, &tree);

    if config.impute.normalize_heat {
        tree.normalize_heat();
        notify(&mut observer, Stage::HeatNormalized, &tree);
    }

    tracing::info!(
        "Prepared tree: {} nodes, depth {}, root '{}'",
        tree.len(),
        tree.depth(),
        tree.root
    );
    Ok(tree)
}

/// Colorer for the configured mode.
pub fn make_colorer(tree: &Tree, config: &ColorConfig) -> Result<Box<dyn Colorer>> {
    let colorer: Box<dyn Colorer> = match config.mode {
        ColorMode::None => Box::new(NoneColorer),
        ColorMode::Heat => Box::new(HeatColorer::new(config.load_palette()?)),
        ColorMode::Hue => Box::new(TreeHueColorer::new(tree, config.hue_settings())),
    };
    tracing::debug!("Coloring by {}", config.mode.name());
    Ok(colorer)
}

/// Lay out a prepared tree.
pub fn render_tree(tree: &Tree, config: &Config) -> Result<UIBox> {
    let colorer = make_colorer(tree, &config.color)?;
    let builder = UITreeMapBuilder::new(colorer, config.color.border_color()?);
    Ok(builder.new_ui_treemap(tree, &config.layout))
}

/// Parse, prepare and lay out one input document.
pub fn render_document(document: &str, format: InputFormat, config: &Config) -> Result<UIBox> {
    let parsed = input::parse_document(document, format, config.input.count_statements)?;
    tracing::debug!(
        "Parsed {} records as {:?}",
        parsed.records.len(),
        parsed.format
    );
    let tree = prepare_tree(&parsed.records, parsed.policy, config, None)?;
    render_tree(&tree, config)
}
