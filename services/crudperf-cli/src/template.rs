/// Template written by `crudperf generate-config`.
pub const CONFIG_TEMPLATE: &str = r#"# crudperf configuration
#
# Every value can also be set through the environment, e.g.
#   CRUDPERF_TARGET__BASE_URL=http://localhost:4567
#   CRUDPERF_WORKLOAD__SIZES=10,50,100

[target]
base_url = "http://localhost:4567"
# Per-request timeout; leave unset to wait as long as the target takes
# request_timeout_secs = 30
# Observe the target server process instead of the harness itself
# pid = 12345

[workload]
sizes = [10, 50, 100, 200, 500, 1000]
operations = ["create", "update", "delete"]
object_types = ["todo"]

[sampling]
interval_ms = 100
stop_grace_ms = 1000

[driver]
cooldown_ms = 2000

[output]
path = "performance_results.csv"
format = "csv"
# samples_path = "performance_samples.csv"
"#;
