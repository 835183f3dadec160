/// Example: Load a model and print what the importer made of it
///
/// Usage: cargo run --example load_model -- path/to/die.obj [--by-position]
use std::env;
use std::path::Path;

use anyhow::{bail, Context, Result};
use dicebox_core::{load_model, ImportOptions, VertexIdentity};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let Some(path) = args.get(1) else {
        bail!("Usage: {} <model.obj|model.stl> [--by-position]", args[0]);
    };

    let options = ImportOptions {
        identity: if args.iter().any(|arg| arg == "--by-position") {
            VertexIdentity::Position
        } else {
            VertexIdentity::Attributes
        },
        ..ImportOptions::default()
    };

    let model = load_model(Path::new(path), &options)
        .with_context(|| format!("Failed to import {}", path))?;

    println!("Model:      {}", model.source.display());
    println!("Vertices:   {}", model.mesh.vertices().len());
    println!("Triangles:  {}", model.mesh.triangle_count());
    println!("Normals:    {}", if model.has_normals { "from file" } else { "computed" });
    println!("Tex coords: {}", model.has_tex_coords);
    if let Some(texture) = &model.diffuse_texture {
        println!("Texture:    {}", texture.display());
    }
    if let Some(bounds) = model.mesh.bounds() {
        println!(
            "Bounds:     ({:.3}, {:.3}, {:.3}) .. ({:.3}, {:.3}, {:.3})",
            bounds.min.x, bounds.min.y, bounds.min.z, bounds.max.x, bounds.max.y, bounds.max.z
        );
    }

    Ok(())
}
