use std::{
	env,
	process
};

use rgk_models_khronos::{
	import::{
		load,
		LoadError,
		Source
	},
	ImportCfg,
	ImportFlag
};

fn main() -> Result<(), LoadError> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

	let mut cfg = ImportCfg::default();
	let mut input = None;
	for arg in env::args().skip(1) {
		match arg.as_str() {
			"--strict" => cfg.flags |= ImportFlag::STRICT,
			"--lenient" => cfg.flags |= ImportFlag::SKIP_MISSING_BUFFERS,
			_ => input = Some(arg),
		}
	}

	let input = match input {
		Some(i) => i,
		None => {
			eprintln!("Usage: glbinfo <file-or-url> [--strict] [--lenient]");
			process::exit(2);
		},
	};

	let gltf = load(Source::from_arg(&input), &cfg)?;
	let doc = &gltf.document;

	println!("asset: version {}", doc.asset.version);
	if let Some(ref generator) = doc.asset.generator {
		println!("  generator: {}", generator);
	}

	if let Some(ref container) = gltf.container {
		println!("GLB: {} bytes", container.header.length);
		for chunk in container.chunks.iter() {
			println!("  chunk {}: {} bytes", chunk.kind, chunk.length);
		}
	}

	println!("{} scenes, {} nodes, {} meshes", doc.scenes.len(), doc.nodes.len(), doc.meshes.len());

	for (i, buffer) in doc.buffers.iter().enumerate() {
		match gltf.store().source_of(i) {
			Some(source) => println!("buffer {}: {} bytes ({:?})", i, buffer.byte_length, source),
			None => println!("buffer {}: {} bytes (missing)", i, buffer.byte_length),
		}
	}

	for (i, result) in gltf.decode_all().iter().enumerate() {
		let accessor = &doc.accessors[i];
		match result {
			Ok(data) => println!("accessor {}: {} x {} {:?}, {} bytes", i, accessor.count, accessor.kind,
				accessor.component_type, data.len()),
			Err(e) => println!("accessor {}: {}", i, e),
		}
	}

	Ok(())
}
