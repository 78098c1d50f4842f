use super::*;

#[test]
fn test_breaking_out_of_loop_with_goto() {
    let mut r = program(&[
        "10fory=1to2",
        "20forx=8to9",
        "30?y;x",
        "40goto60",
        "50next",
        "60nexty",
    ]);
    r.enter("run");
    assert_eq!(run(&mut r), " 1  8 \n 2  8 \n");
}

#[test]
fn test_body_skipped_when_start_past_stop() {
    let mut r = Runtime::default();
    r.enter(r#"FOR I=3 TO 0:PRINT I:NEXT I:PRINT "DONE""#);
    assert_eq!(run(&mut r), "DONE\n");
}

#[test]
fn test_negative_step() {
    let mut r = Runtime::default();
    r.enter("FOR I=3 TO 1 STEP -1:PRINT I;:NEXT");
    assert_eq!(run(&mut r), " 3  2  1 ");
}

#[test]
fn test_integer_counter_ends_past_stop() {
    let mut r = Runtime::default();
    r.enter("FOR I%=1 TO 3:NEXT:PRINT I%");
    assert_eq!(run(&mut r), " 4 \n");
}

#[test]
fn test_next_with_two_variables() {
    let mut r = program(&["10 FOR I=1 TO 2:FOR J=1 TO 2", "20 PRINT I;J;", "30 NEXT J,I"]);
    r.enter("RUN");
    assert_eq!(run(&mut r), " 1  1  1  2  2  1  2  2 ");
}

#[test]
fn test_zero_step_keeps_looping() {
    let mut r = program(&[
        "10 FOR I=1 TO 2 STEP 0:N=N+1:IF N<5 THEN NEXT",
        "20 PRINT I;N",
    ]);
    r.enter("RUN");
    assert_eq!(run(&mut r), " 1  5 \n");
}

#[test]
fn test_next_without_for() {
    let mut r = program(&["10 NEXT"]);
    r.enter("RUN");
    assert_eq!(run(&mut r), "NEXT WITHOUT FOR IN 10\n");
}

#[test]
fn test_for_without_next() {
    let mut r = program(&["10 FOR I=1 TO 2", "20 PRINT I"]);
    r.enter("RUN");
    assert_eq!(run(&mut r), "FOR WITHOUT NEXT IN 10\n");
}

#[test]
fn test_mismatched_next_variable() {
    let mut r = program(&["10 FOR I=1 TO 2", "20 NEXT J"]);
    r.enter("RUN");
    assert_eq!(run(&mut r), "NEXT WITHOUT FOR IN 20\n");
}

#[test]
fn test_string_counter() {
    let mut r = Runtime::default();
    r.enter("FOR A$=1 TO 2:NEXT");
    assert_eq!(run(&mut r), "TYPE MISMATCH\n");
}
