// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

mod common;

use common::Harness;
use sable_core::testing::DeviceCall;
use sable_pipeline::PipelineError;
use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

const FIRST: &str = r#"(
    framebuffers: [(name: "hdr", width: 64, height: 64, attachments: [(format: Rgba16F)])],
    uniforms: ["u_texHdr"],
    frame: [SetPass("MAIN"), Clear(buffers: All)],
)"#;

const SECOND: &str = r#"(
    framebuffers: [(name: "bloom", width: 32, height: 32, attachments: [(format: Rgba16F)])],
    uniforms: ["u_texBloom"],
    frame: [SetPass("MAIN"), Clear(buffers: All), SetPass("POST"), Clear(buffers: Depth)],
)"#;

fn rewrite(path: &Path, text: &str, seconds_ahead: u64) {
    fs::write(path, text).unwrap();
    let file = fs::OpenOptions::new().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(seconds_ahead))
        .unwrap();
}

#[test]
fn test_reload_picks_up_changed_file() {
    let mut h = Harness::new();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("main.ron");
    fs::write(&path, FIRST).unwrap();

    h.pipeline
        .load_file(&mut h.device, &mut h.library, &path)
        .unwrap();
    assert!(h.pipeline.framebuffer("hdr").is_some());
    assert!(!h.pipeline.reload_if_changed(&mut h.device, &mut h.library));

    rewrite(&path, SECOND, 10);
    assert!(h.pipeline.reload_if_changed(&mut h.device, &mut h.library));
    assert!(h.pipeline.framebuffer("hdr").is_none());
    assert!(h.pipeline.framebuffer("bloom").is_some());
    assert_eq!(h.device.live_framebuffer_count(), 1);
    assert!(h.device.uniform("u_texHdr").is_none());
    assert!(h.device.uniform("u_texBloom").is_some());

    h.render();
    assert_eq!(h.pipeline.allocated_views().len(), 2);
}

#[test]
fn test_broken_file_keeps_previous_definition() {
    let mut h = Harness::new();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("main.ron");
    fs::write(&path, FIRST).unwrap();
    h.pipeline
        .load_file(&mut h.device, &mut h.library, &path)
        .unwrap();

    rewrite(&path, "(frame: [SetPass(", 10);
    assert!(!h.pipeline.reload_if_changed(&mut h.device, &mut h.library));
    assert!(h.pipeline.framebuffer("hdr").is_some());
    assert!(!h.pipeline.reload_if_changed(&mut h.device, &mut h.library));

    rewrite(&path, SECOND, 20);
    assert!(h.pipeline.reload_if_changed(&mut h.device, &mut h.library));
    assert!(h.pipeline.framebuffer("bloom").is_some());
}

#[test]
fn test_reload_keeps_builtin_uniforms() {
    let mut h = Harness::new();
    h.load(FIRST);
    let light = h.device.uniform("u_lightPosRadius").unwrap();

    h.device.clear_calls();
    h.load(SECOND);
    assert_eq!(h.device.uniform("u_lightPosRadius"), Some(light));
    assert!(!h.device.calls().iter().any(|c| matches!(
        c,
        DeviceCall::CreateUniform { name, .. } if name == "u_lightPosRadius"
    )));
    assert!(!h
        .device
        .calls()
        .contains(&DeviceCall::DestroyUniform(light)));
}

#[test]
fn test_reloading_same_uniform_keeps_its_handle() {
    let mut h = Harness::new();
    h.load(FIRST);
    let hdr = h.device.uniform("u_texHdr").unwrap();
    h.load(FIRST);
    assert_eq!(h.device.uniform("u_texHdr"), Some(hdr));
}

#[test]
fn test_bad_text_is_a_parse_error() {
    let mut h = Harness::new();
    let err = h
        .pipeline
        .load_ron(&mut h.device, &mut h.library, "(frame: [Explode])")
        .unwrap_err();
    assert!(matches!(err, PipelineError::Parse(_)));
    assert!(!h.pipeline.is_loaded());
}

#[test]
fn test_missing_file_is_an_io_error() {
    let mut h = Harness::new();
    let dir = tempfile::tempdir().unwrap();
    let err = h
        .pipeline
        .load_file(&mut h.device, &mut h.library, dir.path().join("nope.ron"))
        .unwrap_err();
    assert!(matches!(err, PipelineError::Io { .. }));
}
