use spjql::{
    core::ErrorKind,
    sql::{
        session::context::{Config, QueryContext},
        Session,
    },
};
use tempfile::TempDir;

fn open(dir: &TempDir) -> Session {
    let config = Config {
        data_dir: Some(dir.path().to_path_buf()),
        ..Config::default()
    };
    Session::new(QueryContext::open(config).unwrap())
}

fn close(session: Session) {
    session.into_context().close().unwrap();
}

#[test]
fn catalog_and_rows_survive_reopen() {
    let dir = TempDir::new().unwrap();

    let mut session = open(&dir);
    for sql in [
        "CREATE TABLE r (a INT PRIMARY KEY, b VARCHAR)",
        "CREATE TABLE s (c INT, d INT PRIMARY KEY)",
        "CREATE TABLE gone (x INT)",
        "INSERT INTO r VALUES (1, 'x'), (2, 'y')",
        "INSERT INTO s VALUES (1, 10), (2, 20), (2, 30)",
        "DROP TABLE gone",
    ] {
        session.execute(sql).unwrap();
    }
    close(session);

    let mut session = open(&dir);
    let tables = session.execute("SHOW TABLES").unwrap();
    let names = tables
        .rows
        .iter()
        .map(|row| row.values[0].to_string())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["r", "s"]);

    let result = session
        .execute("SELECT b, d FROM r, s WHERE r.a = s.c")
        .unwrap();
    let mut rows = result
        .rows
        .iter()
        .map(|row| row.to_string())
        .collect::<Vec<_>>();
    rows.sort();
    assert_eq!(rows, vec!["x\t10", "y\t20", "y\t30"]);

    assert_eq!(
        session.execute("CREATE TABLE r (a INT)").unwrap_err().kind,
        ErrorKind::RelationExists
    );
    close(session);
    dir.close().unwrap();
}

#[test]
fn keyless_rows_get_distinct_ids_across_reopen() {
    let dir = TempDir::new().unwrap();

    let mut session = open(&dir);
    session.execute("CREATE TABLE t (x INT)").unwrap();
    session.execute("INSERT INTO t VALUES (1), (1)").unwrap();
    close(session);

    let mut session = open(&dir);
    session.execute("INSERT INTO t VALUES (1)").unwrap();
    assert_eq!(session.execute("SELECT x FROM t").unwrap().rows.len(), 3);
    close(session);
    dir.close().unwrap();
}
