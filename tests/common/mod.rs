//! Fixtures shared by the integration tests: small but realistic wheels and
//! sdists of an upstream `pythonmonkey` dev release.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Cursor;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use wheelfork::DigestEncoding;
use wheelfork::ForkConfig;
use wheelfork::hash_content;
use zip::ZipArchive;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

pub const VERSION: &str = "1.0.1.dev3+abc123";
pub const WHEEL_NAME: &str =
    "pythonmonkey-1.0.1.dev3+abc123-cp312-cp312-manylinux_2_31_x86_64.whl";
pub const SDIST_NAME: &str = "pythonmonkey-1.0.1.dev3+abc123.tar.gz";

pub const NEW_REQUIRE: &str = "# require.py as shipped by the fork\nimport pythonmonkey as pm\n";
pub const NEW_INIT: &str = "# fork __init__\nfrom .require import *\n";

pub const METADATA: &str = "Metadata-Version: 2.1
Name: pythonmonkey
Version: 1.0.1.dev3+abc123
Summary: Seamless interop between Python and JavaScript.
Requires-Python: >=3.8,<4.0
Requires-Dist: pminit (>=0.4.0)
Requires-Dist: aiohttp[speedups] (>=3.8,<4.0)

# PythonMonkey
";

pub const PYPROJECT: &str = r#"[tool.poetry]
name = "pythonmonkey"
version = "0"
description = "Seamless interop between Python and JavaScript."

[tool.poetry.dependencies]
python = "^3.8"
aiohttp = { version = "^3.8", extras = ["speedups"] }
pminit = { version = ">=0.4.0", allow-prereleases = true }

[build-system]
requires = ["poetry-core>=1.1.1", "poetry-dynamic-versioning==1.1.1"]
"#;

/// Build a wheel with a valid RECORD (URL-safe digests, as real builders write)
pub fn build_wheel(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let dist_info = entries
        .iter()
        .find_map(|(name, _)| name.split_once(".dist-info/").map(|(p, _)| p))
        .expect("fixture has a dist-info directory");
    let record_path = format!("{}.dist-info/RECORD", dist_info);

    let mut record = String::new();
    for (name, contents) in entries {
        record.push_str(&format!(
            "{},{},{}\n",
            name,
            hash_content(contents, DigestEncoding::UrlSafeNoPad),
            contents.len()
        ));
    }
    record.push_str(&format!("{},,\n", record_path));

    let mut buf = Cursor::new(Vec::new());
    {
        let mut zip = ZipWriter::new(&mut buf);
        let options = SimpleFileOptions::default();
        for (name, contents) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(contents).unwrap();
        }
        zip.start_file(record_path.as_str(), options).unwrap();
        zip.write_all(record.as_bytes()).unwrap();
        zip.finish().unwrap();
    }
    buf.into_inner()
}

pub fn pythonmonkey_wheel() -> Vec<u8> {
    build_wheel(&[
        ("pythonmonkey/__init__.py", b"# upstream __init__\n"),
        ("pythonmonkey/require.py", b"# upstream require\n"),
        ("pythonmonkey/helpers.py", b"def typeof(x): pass\n"),
        ("pythonmonkey/pythonmonkey.so", b"\x7fELF\x02\x01\x01\x00"),
        (
            "pythonmonkey-1.0.1.dev3+abc123.dist-info/METADATA",
            METADATA.as_bytes(),
        ),
        (
            "pythonmonkey-1.0.1.dev3+abc123.dist-info/WHEEL",
            b"Wheel-Version: 1.0\nGenerator: poetry-core 1.9.0\nRoot-Is-Purelib: false\nTag: cp312-cp312-manylinux_2_31_x86_64\n",
        ),
    ])
}

/// Build a gzip tarball from `(path, contents)` pairs
pub fn build_tarball(files: &[(&str, &str)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (path, contents) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        builder
            .append_data(&mut header, path, contents.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

pub fn pythonmonkey_sdist() -> Vec<u8> {
    build_tarball(&[
        ("pythonmonkey-1.0.1.dev3+abc123/pyproject.toml", PYPROJECT),
        ("pythonmonkey-1.0.1.dev3+abc123/PKG-INFO", METADATA),
        (
            "pythonmonkey-1.0.1.dev3+abc123/python/pythonmonkey/require.py",
            "# upstream require\n",
        ),
        (
            "pythonmonkey-1.0.1.dev3+abc123/python/pythonmonkey/__init__.py",
            "# upstream __init__\n",
        ),
        (
            "pythonmonkey-1.0.1.dev3+abc123/src/modules/pythonmonkey/pythonmonkey.cc",
            "// engine bindings\n",
        ),
    ])
}

/// Write the fork's versions of the tracked files below `dir`
pub fn write_sources(dir: &Path) -> PathBuf {
    let root = dir.join("python");
    std::fs::create_dir_all(root.join("pythonmonkey")).unwrap();
    std::fs::write(root.join("pythonmonkey/require.py"), NEW_REQUIRE).unwrap();
    std::fs::write(root.join("pythonmonkey/__init__.py"), NEW_INIT).unwrap();
    root
}

/// Default fork settings reading sources from `source_root` and writing to `dist`
pub fn config(source_root: &Path, dist: &Path) -> ForkConfig {
    ForkConfig {
        source_root: source_root.to_path_buf(),
        dist_dir: dist.to_path_buf(),
        ..ForkConfig::default()
    }
}

pub fn read_zip(path: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut entries = BTreeMap::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).unwrap();
        if file.is_dir() {
            continue;
        }
        let mut contents = Vec::new();
        file.read_to_end(&mut contents).unwrap();
        entries.insert(file.name().to_string(), contents);
    }
    entries
}

pub fn read_tarball(path: &Path) -> BTreeMap<String, String> {
    let mut archive = tar::Archive::new(GzDecoder::new(File::open(path).unwrap()));
    let mut entries = BTreeMap::new();
    for entry in archive.entries().unwrap() {
        let mut entry = entry.unwrap();
        if entry.header().entry_type().is_dir() {
            continue;
        }
        let path = entry.path().unwrap().to_string_lossy().into_owned();
        let mut contents = String::new();
        entry.read_to_string(&mut contents).unwrap();
        entries.insert(path, contents);
    }
    entries
}
