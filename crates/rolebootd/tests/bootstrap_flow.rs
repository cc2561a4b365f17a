//! End-to-end bootstrap tests.
//!
//! Runs the assembled daemon stack (redb store replica, file sentinel, k3s
//! descriptor, systemd handle) against a scratch root where `systemctl`
//! is replaced by `true`.

use std::path::Path;
use std::time::Duration;

use roleboot_core::*;
use roleboot_node::{Distro, ServiceCommands, ServiceManager};
use roleboot_state::StateStore;
use rolebootd::{BootstrapScheduler, RolebootConfig, SchedulerExit, build_bootstrap};
use tokio::sync::watch;

fn test_config(root: &Path) -> RolebootConfig {
    let mut config = RolebootConfig {
        node_id: Some("node-a".to_string()),
        data_dir: root.join("var/lib/roleboot"),
        role: Some(Role::Worker),
        ..Default::default()
    };
    config.network.address = Some("10.0.0.9".to_string());
    config.platform.root = root.to_path_buf();
    config.platform.commands = ServiceCommands {
        systemctl: "true".to_string(),
        rc_service: "true".to_string(),
        rc_update: "true".to_string(),
    };
    config
}

fn install_k3s(root: &Path) {
    let bin = root.join("usr/bin/k3s");
    std::fs::create_dir_all(bin.parent().unwrap()).unwrap();
    std::fs::write(&bin, b"").unwrap();
    std::fs::create_dir_all(root.join("run/systemd/system")).unwrap();
}

fn test_store() -> StateStore {
    StateStore::open_in_memory().unwrap()
}

#[test]
fn single_attempt_configures_k3s_worker() {
    let dir = tempfile::tempdir().unwrap();
    install_k3s(dir.path());
    let config = test_config(dir.path());
    let store = test_store();
    store.put_value("cluster", "leader-address", "10.0.0.1").unwrap();
    store.put_value("cluster", "node-token", "K10::secret").unwrap();

    let mut bootstrap = build_bootstrap(&config, store.clone()).unwrap();
    let outcome = bootstrap.attempt();
    assert!(matches!(outcome, BootstrapOutcome::Completed(Completion::Sealed)));

    assert!(config.sentinel_path().exists());
    assert_eq!(store.get_value("role", "node-a").unwrap().as_deref(), Some("worker"));
    assert_eq!(store.get_value("ip", "node-a").unwrap().as_deref(), Some("10.0.0.9"));

    let env = std::fs::read_to_string(
        dir.path().join("etc/systemd/system/k3s-agent.service.env"),
    )
    .unwrap();
    assert!(env.contains("K3S_URL=https://10.0.0.1:6443"));

    let drop_in = std::fs::read_to_string(
        dir.path()
            .join("etc/systemd/system/k3s-agent.service.d/override.conf"),
    )
    .unwrap();
    let bin = dir.path().join("usr/bin/k3s").display().to_string();
    assert!(drop_in.contains(&format!(
        "ExecStart={bin} agent --with-node-id --node-ip 10.0.0.9\n"
    )));
    let env_file = dir.path().join("etc/systemd/system/k3s-agent.service.env");
    assert!(drop_in.contains(&format!("EnvironmentFile=-{}\n", env_file.display())));
}

#[test]
fn openrc_k3s_worker_sources_join_material() {
    let dir = tempfile::tempdir().unwrap();
    install_k3s(dir.path());
    let mut config = test_config(dir.path());
    config.platform.service_manager = Some(ServiceManager::OpenRc);
    let store = test_store();
    store.put_value("cluster", "leader-address", "10.0.0.1").unwrap();
    store.put_value("cluster", "node-token", "K10::secret").unwrap();

    let mut bootstrap = build_bootstrap(&config, store).unwrap();
    assert!(matches!(
        bootstrap.attempt(),
        BootstrapOutcome::Completed(Completion::Sealed)
    ));

    let env_file = dir.path().join("etc/systemd/system/k3s-agent.service.env");
    let env = std::fs::read_to_string(&env_file).unwrap();
    assert!(env.contains("K3S_URL=https://10.0.0.1:6443\n"));
    assert!(env.contains("K3S_TOKEN=K10::secret\n"));

    let script = std::fs::read_to_string(dir.path().join("etc/init.d/k3s-agent")).unwrap();
    assert!(script.contains(&format!(". \"{}\"", env_file.display())));
    assert!(script.contains("set -a\n"));
    let bin = dir.path().join("usr/bin/k3s").display().to_string();
    assert!(script.contains(&format!("command=\"{bin}\"\n")));
    assert!(script.contains("command_args=\"agent --with-node-id --node-ip 10.0.0.9\"\n"));
}

#[test]
fn k0s_worker_token_flag_names_written_file() {
    let dir = tempfile::tempdir().unwrap();
    let bin = dir.path().join("usr/bin/k0s");
    std::fs::create_dir_all(bin.parent().unwrap()).unwrap();
    std::fs::write(&bin, b"").unwrap();
    let mut config = test_config(dir.path());
    config.platform.service_manager = Some(ServiceManager::OpenRc);
    let store = test_store();
    store.put_value("cluster", "leader-address", "10.0.0.1").unwrap();
    store.put_value("cluster", "worker-token", "k0s-token").unwrap();

    let mut bootstrap = build_bootstrap(&config, store).unwrap();
    assert!(bootstrap.attempt().is_completed());

    let token_file = dir.path().join("etc/k0s/worker-token");
    assert_eq!(std::fs::read_to_string(&token_file).unwrap(), "k0s-token");
    let script = std::fs::read_to_string(dir.path().join("etc/init.d/k0sworker")).unwrap();
    assert!(script.contains(&format!(
        "command_args=\"worker --token-file {}\"\n",
        token_file.display()
    )));
    assert!(!script.contains("set -a"));
}

#[test]
fn sealed_node_is_left_alone() {
    let dir = tempfile::tempdir().unwrap();
    install_k3s(dir.path());
    let config = test_config(dir.path());
    let store = test_store();
    store.put_value("cluster", "leader-address", "10.0.0.1").unwrap();
    store.put_value("cluster", "node-token", "tok").unwrap();

    let mut bootstrap = build_bootstrap(&config, store.clone()).unwrap();
    assert!(bootstrap.attempt().is_completed());

    let drop_in = dir
        .path()
        .join("etc/systemd/system/k3s-agent.service.d/override.conf");
    std::fs::remove_file(&drop_in).unwrap();

    // A fresh process sees the sentinel and does nothing.
    let mut bootstrap = build_bootstrap(&config, store).unwrap();
    assert!(matches!(
        bootstrap.attempt(),
        BootstrapOutcome::Completed(Completion::AlreadySealed)
    ));
    assert!(!drop_in.exists());
}

#[test]
fn missing_token_defers_after_publishing_address() {
    let dir = tempfile::tempdir().unwrap();
    install_k3s(dir.path());
    let config = test_config(dir.path());
    let store = test_store();
    store.put_value("cluster", "leader-address", "10.0.0.1").unwrap();

    let mut bootstrap = build_bootstrap(&config, store.clone()).unwrap();
    assert!(matches!(
        bootstrap.attempt(),
        BootstrapOutcome::Deferred(DeferReason::JoinTokenUnavailable)
    ));
    assert_eq!(store.get_value("ip", "node-a").unwrap().as_deref(), Some("10.0.0.9"));
    assert!(!config.sentinel_path().exists());
}

#[tokio::test]
async fn scheduler_completes_once_leader_publishes() {
    let dir = tempfile::tempdir().unwrap();
    install_k3s(dir.path());
    let config = test_config(dir.path());
    let store = test_store();

    let bootstrap = build_bootstrap(&config, store.clone()).unwrap();
    let scheduler = BootstrapScheduler::new(bootstrap, Duration::from_millis(20));
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(scheduler.run(shutdown_rx));

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(!config.sentinel_path().exists());
    // The forced role is visible while the node is still waiting.
    assert_eq!(store.get_value("role", "node-a").unwrap().as_deref(), Some("worker"));

    store.put_value("cluster", "leader-address", "10.0.0.1").unwrap();
    store.put_value("cluster", "node-token", "tok").unwrap();

    let exit = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(matches!(exit, SchedulerExit::Completed(Completion::Sealed)));
    assert!(config.sentinel_path().exists());
}

#[tokio::test]
async fn scheduler_stops_on_fatal_failure() {
    let dir = tempfile::tempdir().unwrap();
    // No distribution installed.
    let config = test_config(dir.path());
    let store = test_store();
    store.put_value("cluster", "leader-address", "10.0.0.1").unwrap();

    let bootstrap = build_bootstrap(&config, store).unwrap();
    let scheduler = BootstrapScheduler::new(bootstrap, Duration::from_millis(20));
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    let exit = tokio::time::timeout(Duration::from_secs(5), scheduler.run(shutdown_rx))
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(
        exit,
        SchedulerExit::Fatal(BootstrapError::PlatformDetection(_))
    ));
    assert!(!config.sentinel_path().exists());
}

#[tokio::test]
async fn scheduler_honours_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.platform.distro = Some(Distro::K3s);
    let store = test_store();

    let bootstrap = build_bootstrap(&config, store).unwrap();
    let scheduler = BootstrapScheduler::new(bootstrap, Duration::from_secs(3600));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(scheduler.run(shutdown_rx));

    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown_tx.send(true).unwrap();

    let exit = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(matches!(exit, SchedulerExit::Shutdown));
}

#[tokio::test]
async fn scheduler_keeps_retrying_when_shutdown_sender_is_gone() {
    let dir = tempfile::tempdir().unwrap();
    install_k3s(dir.path());
    let config = test_config(dir.path());
    let store = test_store();

    let bootstrap = build_bootstrap(&config, store.clone()).unwrap();
    let scheduler = BootstrapScheduler::new(bootstrap, Duration::from_millis(20));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    drop(shutdown_tx);
    let handle = tokio::spawn(scheduler.run(shutdown_rx));

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(!handle.is_finished());

    store.put_value("cluster", "leader-address", "10.0.0.1").unwrap();
    store.put_value("cluster", "node-token", "tok").unwrap();

    let exit = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(matches!(exit, SchedulerExit::Completed(Completion::Sealed)));
}
