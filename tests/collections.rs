mod common;

use common::{get, run_ok};
use embercore::value::Value;

/// spec.md §8 scenario 6: `foreach (var k, v in d)` binds key and stored
/// value, `indexed` prepends the index, and reassembling via `dict(sort(...))`
/// round-trips the original.
#[test]
fn foreach_with_index_over_dict_pairs() {
    run_ok(
        r#"
        var d = {"a": 3, "b": 4};
        var out = [];
        foreach (var k, v in d) { append(out, [k, v]); }
        var rebuilt = dict(sort(out, func(a,b) => a[0] < b[0]));
        assert(rebuilt == d);
        "#,
    );
}

#[test]
fn foreach_indexed_over_array_prepends_index() {
    let env = run_ok(
        r#"
        var xs = [10, 20, 30];
        var pairs = [];
        foreach (indexed i, v in xs) { append(pairs, [i, v]); }
        assert(pairs == [[0,10],[1,20],[2,30]]);
        "#,
    );
    assert_eq!(get(&env, "pairs").len(Default::default()).unwrap(), 3);
}

#[test]
fn foreach_over_string_binds_one_char_slices() {
    run_ok(
        r#"
        var out = [];
        foreach (c in "hi") { append(out, c); }
        assert(out == ["h", "i"]);
        "#,
    );
}

#[test]
fn foreach_extra_targets_receive_none() {
    let env = run_ok(
        r#"
        var last = "sentinel";
        foreach (v, extra in [1, 2, 3]) { last = extra; }
        "#,
    );
    assert_eq!(get(&env, "last"), Value::None);
}

#[test]
fn dict_member_access_inserts_none_on_first_read() {
    let env = run_ok(
        r#"
        var d = {};
        d.x = 5;
        var y = d.y;
        "#,
    );
    assert_eq!(get(&env, "y"), Value::None);
}

#[test]
fn dict_subscript_supports_compound_assignment() {
    let env = run_ok(
        r#"
        var d = {"count": 1};
        d["count"] += 1;
        assert(d["count"] == 2);
        "#,
    );
    assert!(matches!(get(&env, "d"), Value::Dict(_)));
}
