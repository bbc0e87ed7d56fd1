/*!
 * Configuration Tests
 * Defaults, presets and environment overrides
 */

use fs_access::config::{ENV_MAX_STEPS, ENV_MEMORY_CAPACITY};
use fs_access::{
    Agent, AgentConfig, CreateWritableOptions, FileSystem, FsError, GetHandleOptions,
    MemoryBackendConfig,
};
use pretty_assertions::assert_eq;
use serial_test::serial;

#[test]
#[serial]
fn test_env_overrides() {
    std::env::set_var(ENV_MAX_STEPS, "42");
    std::env::set_var(ENV_MEMORY_CAPACITY, " 1024 ");
    assert_eq!(AgentConfig::from_env().max_steps, 42);
    assert_eq!(MemoryBackendConfig::from_env().capacity, Some(1024));

    std::env::remove_var(ENV_MAX_STEPS);
    std::env::remove_var(ENV_MEMORY_CAPACITY);
    assert_eq!(AgentConfig::from_env(), AgentConfig::default());
    assert_eq!(MemoryBackendConfig::from_env(), MemoryBackendConfig::default());
}

#[test]
#[serial]
fn test_unparsable_env_falls_back() {
    std::env::set_var(ENV_MAX_STEPS, "lots");
    assert_eq!(AgentConfig::from_env(), AgentConfig::default());
    std::env::remove_var(ENV_MAX_STEPS);
}

#[test]
fn test_config_deserialization() {
    let config: MemoryBackendConfig = serde_json::from_str(r#"{"capacity":16}"#).unwrap();
    assert_eq!(config.capacity, Some(16));
    assert_eq!(config.file_mode, 0o644);

    let config: AgentConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config, AgentConfig::default());
}

#[test]
fn test_step_budget_stops_block_on() {
    let (fs, _backend) = FileSystem::in_memory(Agent::with_config(AgentConfig::bounded(0)));
    let err = fs
        .block_on(fs.root().get_file_handle("f", GetHandleOptions::create()))
        .unwrap_err();
    assert!(matches!(err, FsError::InvalidState(_)));
    assert!(!fs.agent().is_idle());
}

#[test]
fn test_new_files_use_configured_mode() {
    let config = MemoryBackendConfig {
        file_mode: 0o444,
        ..MemoryBackendConfig::default()
    };
    let (fs, backend) = FileSystem::in_memory_with_config(Agent::new(), config);
    assert_eq!(backend.config(), &config);
    let file = fs
        .block_on(fs.root().get_file_handle("ro", GetHandleOptions::create()))
        .unwrap();

    let err = fs
        .block_on(file.create_writable(CreateWritableOptions::default()))
        .unwrap_err();
    assert_eq!(err.name(), "NotAllowedError");
}
