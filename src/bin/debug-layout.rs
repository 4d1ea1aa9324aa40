/// Diagnostic tool to verify input → tree → layout pipeline
use heattree::input::{self, InputFormat};
use heattree::pipeline::{prepare_tree, render_tree, Stage};
use heattree::tree::Tree;
use heattree::Config;
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("heattree=debug".parse()?),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let Some(input_path) = args.next().map(PathBuf::from) else {
        anyhow::bail!("usage: debug-layout <INPUT> [WIDTH HEIGHT]");
    };

    let mut config = Config::default();
    if let (Some(w), Some(h)) = (args.next(), args.next()) {
        config.layout.width = w.parse()?;
        config.layout.height = h.parse()?;
    }
    config.validate()?;

    println!("=== DIAGNOSTIC: Input → Tree → Layout Pipeline ===");
    println!("Input: {}", input_path.display());

    // Parse
    let document = std::fs::read_to_string(&input_path)?;
    let parsed = input::parse_document(&document, InputFormat::Auto, config.input.count_statements)?;
    println!(
        "\n[1] Parsed {} records as {:?} (duplicates: {:?})",
        parsed.records.len(),
        parsed.format,
        parsed.policy
    );

    // Build + transform, recording node counts per stage
    let mut stage_counts: Vec<(Stage, usize)> = Vec::new();
    let mut observer = |stage: Stage, tree: &Tree| stage_counts.push((stage, tree.len()));
    let tree = prepare_tree(&parsed.records, parsed.policy, &config, Some(&mut observer))?;

    println!("\n[2] Pipeline stages:");
    for (stage, count) in &stage_counts {
        println!("    {:<16} {} nodes", stage.name(), count);
    }

    let root_node = tree.get(&tree.root);
    println!(
        "\n[3] Root: '{}' (size={:.2}, heat={:.3}, synthetic={}, depth={})",
        tree.root,
        root_node.map_or(0.0, |n| n.size),
        root_node.map_or(0.0, |n| n.heat),
        tree.has_synthetic_root(),
        tree.depth()
    );

    // Show top 10 children of root by size
    println!("\n[4] Top 10 children of root:");
    let mut root_children: Vec<_> = tree.children(&tree.root).to_vec();
    root_children.sort_by(|a, b| tree.node_size(b).total_cmp(&tree.node_size(a)));
    for (i, child) in root_children.iter().take(10).enumerate() {
        let node = tree.get(child);
        println!(
            "    [{}] '{}' - size {:.2}, heat {:.3} (children={})",
            i,
            node.map_or(child.as_str(), |n| n.name.as_str()),
            tree.node_size(child),
            node.map_or(0.0, |n| n.heat),
            tree.children(child).len()
        );
    }

    // Layout
    let root = render_tree(&tree, &config)?;
    let boxes = root.descendants();
    let titled = boxes.iter().filter(|b| b.title.is_some()).count();
    let leaves = boxes.iter().filter(|b| b.children.is_empty()).count();
    println!(
        "\n[5] Layout computed: {} boxes ({} titled, {} leaves)",
        boxes.len() - 1,
        titled,
        leaves
    );

    // Show top 10 largest boxes
    println!("\n[6] Top 10 largest boxes by area:");
    let mut sorted: Vec<_> = boxes.iter().filter(|b| !b.is_root).collect();
    sorted.sort_by(|a, b| b.rect().area().total_cmp(&a.rect().area()));
    for (i, b) in sorted.iter().take(10).enumerate() {
        println!(
            "    [{}] '{}' - {:.1}x{:.1} ({:.0}px²) at ({:.1}, {:.1}) color {}",
            i,
            b.title.as_ref().map_or("", |t| t.text.as_str()),
            b.w,
            b.h,
            b.rect().area(),
            b.x,
            b.y,
            b.color.to_hex()
        );
    }

    // Leaf coverage of the drawable area
    println!("\n[7] Coverage:");
    let leaf_area: f64 = boxes
        .iter()
        .filter(|b| b.children.is_empty() && !b.is_root)
        .map(|b| b.rect().area())
        .sum();
    let drawable = root.rect().area().max(1.0);
    println!("    Leaf box area: {:.0}px²", leaf_area);
    println!("    Drawable area: {:.0}px²", drawable);
    println!("    Coverage: {:.1}%", leaf_area / drawable * 100.0);

    Ok(())
}
