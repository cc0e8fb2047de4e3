//! MySQL test infrastructure.
//!
//! One MySQL container is started lazily and shared by every test in the run; each
//! test gets its own freshly created database inside it.

use std::sync::OnceLock;

use mysql::prelude::*;
use mysql::Conn;
use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::mysql::Mysql;
use tokio::runtime::Runtime;
use uuid::Uuid;

use crate::mysql::MysqlDriver;

/// The shared container, with the runtime that owns its async handle.
struct SharedMysql {
    _runtime: Runtime,
    _container: ContainerAsync<Mysql>,
    port: u16,
}

static MYSQL: OnceLock<SharedMysql> = OnceLock::new();

fn mysql_port() -> u16 {
    MYSQL
        .get_or_init(|| {
            let runtime = Runtime::new().expect("failed to create tokio runtime");
            let (container, port) = runtime.block_on(async {
                let container = Mysql::default()
                    .start()
                    .await
                    .expect("failed to start mysql container");
                let port = container
                    .get_host_port_ipv4(3306)
                    .await
                    .expect("failed to get mysql port");
                (container, port)
            });
            SharedMysql {
                _runtime: runtime,
                _container: container,
                port,
            }
        })
        .port
}

fn url_with_db(db: &str) -> String {
    format!("mysql://root@127.0.0.1:{}/{}", mysql_port(), db)
}

/// Create a uniquely named utf8mb4 database and return its URL.
pub fn fresh_mysql_url() -> String {
    let mut admin = Conn::new(url_with_db("test").as_str()).expect("failed to connect as admin");

    let db_name = format!("test_{}", Uuid::new_v4().simple());
    admin
        .query_drop(format!(
            "CREATE DATABASE `{}` CHARACTER SET utf8mb4 COLLATE utf8mb4_0900_ai_ci",
            db_name
        ))
        .expect("failed to create test database");

    url_with_db(&db_name)
}

/// A driver connected to a fresh, isolated database.
pub fn get_test_driver() -> MysqlDriver {
    MysqlDriver::connect(&fresh_mysql_url()).expect("failed to connect to test database")
}
