use crate::common::TestContext;

#[test]
fn test_coverage_is_merged_across_workers() {
    let context = TestContext::with_files([
        (
            "calc.py",
            r"
            def add(a, b):
                return a + b

            def sub(a, b):
                return a - b
            ",
        ),
        (
            "test_parallel.py",
            r"
            import unittest

            from calc import add

            class Parallel(unittest.TestCase):
                def test_add(self):
                    self.assertEqual(add(1, 2), 3)
            ",
        ),
        (
            "test_serial.py",
            r"
            import unittest

            from calc import sub

            __no_parallel__ = True

            class Serial(unittest.TestCase):
                def test_sub(self):
                    self.assertEqual(sub(3, 2), 1)
            ",
        ),
    ]);

    let output = context
        .command()
        .args(["--coverage", "--num-workers", "2"])
        .output()
        .unwrap();
    let stdout = String::from_utf8(output.stdout).unwrap();

    assert_eq!(output.status.code(), Some(0), "{stdout}");
    assert!(stdout.contains("coverage:"));
    assert!(stdout.contains("calc.py"));

    let cache_dir = context.root().join(".fanout_cache");
    let combined = std::fs::read_to_string(cache_dir.join("coverage.json")).unwrap();
    assert!(combined.contains("calc.py"));

    let leftovers: Vec<_> = std::fs::read_dir(&cache_dir)
        .unwrap()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().starts_with("run-"))
        .collect();
    assert!(leftovers.is_empty());
}
