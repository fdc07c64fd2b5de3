//! Static log corpora used across harnesses.
//!
//! Each corpus is a `&'static [&'static str]` of representative lines for one
//! extraction strategy. Lines in the `*_LINES` corpora are known to match
//! their strategy; `CORPUS_UNSTRUCTURED` is known not to.

/// Lines matching the generic timestamp + level + message pattern.
pub const GENERIC_LINES: &[&str] = &[
    "2023-03-20T15:06:45.057Z [DEBUG] nomad: memberlist: Stream connection from=127.0.0.1:48046",
    "2023-03-20T15:06:46Z [INFO] agent: started",
    "2023-03-20T15:06:47.000Z [WARN] client: slow heartbeat",
    "2023-03-20T15:06:48.5Z [ERROR] raft: failed to contact quorum",
];

/// Sidecar proxy access/diagnostic lines.
pub const SIDECAR_LINES: &[&str] = &[
    "[2023-03-20 15:06:45.057][12][warning][upstream] [source/common/upstream/cluster_manager_impl.cc:1234] cds: add 3 cluster(s)",
    "[2023-03-20 15:06:46.001][1][info][main] [source/server/server.cc:88] starting main dispatch loop",
];

/// logfmt lines.
pub const LOGFMT_LINES: &[&str] = &[
    r#"ts=2023-03-20T15:06:45Z level=info msg="Server started" port=8080"#,
    r#"ts=2023-03-20T15:06:46Z level=error msg="Connection refused" err="dial tcp: connect: connection refused" host=db.internal"#,
    r#"time=2023-03-20T15:06:47Z lvl=warn msg="Slow query" duration_ms=4200 caller=db/query.go:42"#,
    r#"ts=2023-03-20T15:06:48Z level=debug msg="Cache miss" user_id=usr-999 trace_id=4bf92f3577b34da6"#,
];

/// Lines no built-in pattern recognises.
pub const CORPUS_UNSTRUCTURED: &[&str] = &[
    "Starting application version 2.4.1",
    "ERROR: NullPointerException at com.example.App.handle(App.java:42)",
    "GET /api/v1/users 200 47ms",
    "",
    "   ",
    "\u{0}\u{0}\u{0}",
    "héllo wörld ✓",
];

/// Canonical entries as a producer already emitting the schema would send them.
pub const ECS_DOCUMENTS: &[&str] = &[
    r#"{"id":"entry-1","@timestamp":"2023-03-20T15:06:45Z","message":"payment captured","log":{"level":"info","emoji":""},"labels":{"job_name":"payments","job_type":"service"}}"#,
    r#"{"@timestamp":"2023-03-20T15:06:46Z","message":"card declined","tags":["billing"],"log":{"level":"warn"},"service":{"name":"payments","version":"3.1.0"}}"#,
    r#"{"message":"no timestamp, no level"}"#,
];

/// `(literal, year, month, day, hour, minute, second)` for each documented layout.
pub const TIMESTAMP_SAMPLES: &[(&str, i32, u32, u32, u32, u32, u32)] = &[
    ("2023-03-20T15:06:45.057Z", 2023, 3, 20, 15, 6, 45),
    ("2023-03-20T15:06:45.057+02:00", 2023, 3, 20, 15, 6, 45),
    ("2023-03-20T15:06:45.057", 2023, 3, 20, 15, 6, 45),
    ("2023-03-20 15:06:45.057+0000", 2023, 3, 20, 15, 6, 45),
    ("2023-03-20 15:06:45", 2023, 3, 20, 15, 6, 45),
    ("2023/03/20 14:27:52.652648", 2023, 3, 20, 14, 27, 52),
    ("02/Feb/2023:15:04:05 -0700", 2023, 2, 2, 15, 4, 5),
    ("2023-03-19 21:17:04,243+0000", 2023, 3, 19, 21, 17, 4),
    ("2023-03-19 21:17:04,243", 2023, 3, 19, 21, 17, 4),
    ("Mon, 20 Mar 2023 15:06:45 +0000", 2023, 3, 20, 15, 6, 45),
    ("Mon Mar 20 15:06:45 2023", 2023, 3, 20, 15, 6, 45),
    ("Mon Mar 20 15:06:45 -0700 2023", 2023, 3, 20, 15, 6, 45),
];

/// `journalctl -o json` export lines.
pub const JOURNAL_LINES: &[&str] = &[
    r#"{"MESSAGE":"Started Session 4 of user core.","PRIORITY":"6","__REALTIME_TIMESTAMP":"1679324805057000","_HOSTNAME":"node-1","_MACHINE_ID":"b7c1","SYSLOG_IDENTIFIER":"systemd","_PID":"1"}"#,
    r#"{"MESSAGE":"Out of memory: Killed process 4242","PRIORITY":"3","__REALTIME_TIMESTAMP":"1679324806000000","_HOSTNAME":"node-1","_MACHINE_ID":"b7c1","_SYSTEMD_UNIT":"kernel"}"#,
    r#"{"MESSAGE":[104,105,255],"PRIORITY":"4","_HOSTNAME":"node-2"}"#,
];
