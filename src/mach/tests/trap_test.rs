use super::*;

#[test]
fn test_resume_next() {
    let mut r = program(&[
        "10 ON ERROR GOTO 100",
        "20 ERROR 5",
        r#"30 PRINT "AFTER""#,
        "40 END",
        "100 PRINT ERR;ERL",
        "110 RESUME NEXT",
    ]);
    r.enter("RUN");
    assert_eq!(run(&mut r), " 5  20 \nAFTER\n");
}

#[test]
fn test_resume_retries_statement() {
    let mut r = program(&[
        "10 ON ERROR GOTO 100",
        "20 A=10/B",
        "30 PRINT A",
        "40 END",
        "100 B=2:RESUME",
    ]);
    r.enter("RUN");
    assert_eq!(run(&mut r), " 5 \n");
}

#[test]
fn test_resume_line() {
    let mut r = program(&[
        "10 ON ERROR GOTO 100",
        "20 ERROR 200",
        "30 END",
        r#"100 RESUME 110"#,
        r#"110 PRINT "HERE";ERR"#,
    ]);
    r.enter("RUN");
    assert_eq!(run(&mut r), "HERE 0 \n");
}

#[test]
fn test_on_error_goto_zero_in_handler() {
    let mut r = program(&["10 ON ERROR GOTO 100", "20 ERROR 13", "100 ON ERROR GOTO 0"]);
    r.enter("RUN");
    assert_eq!(run(&mut r), "TYPE MISMATCH IN 20\n");
}

#[test]
fn test_handler_without_resume() {
    let mut r = program(&["10 ON ERROR GOTO 100", "20 ERROR 5", r#"100 PRINT "X""#]);
    r.enter("RUN");
    assert_eq!(run(&mut r), "X\nNO RESUME IN 100\n");
}

#[test]
fn test_error_in_handler_is_not_trapped() {
    let mut r = program(&["10 ON ERROR GOTO 100", "20 ERROR 5", "100 ERROR 6"]);
    r.enter("RUN");
    assert_eq!(run(&mut r), "OVERFLOW IN 100\n");
}

#[test]
fn test_on_error_to_missing_line() {
    let mut r = program(&["10 ON ERROR GOTO 100"]);
    r.enter("RUN");
    assert_eq!(run(&mut r), "UNDEFINED LINE NUMBER IN 10\n");
}

#[test]
fn test_resume_without_error() {
    let mut r = Runtime::default();
    r.enter("RESUME");
    assert_eq!(run(&mut r), "RESUME WITHOUT ERROR\n");
}

#[test]
fn test_soft_math_errors() {
    let mut r = Runtime::default();
    r.enter("A=1/0:PRINT A>1E+38");
    assert_eq!(run(&mut r), "DIVISION BY ZERO\n-1 \n");
    r.enter("A=-1/0:PRINT A<-1E+38");
    assert_eq!(run(&mut r), "DIVISION BY ZERO\n-1 \n");
}

#[test]
fn test_trapped_math_error() {
    let mut r = program(&[
        "10 ON ERROR GOTO 100",
        "20 A=1/0",
        "30 END",
        "100 PRINT ERR:RESUME NEXT",
    ]);
    r.enter("RUN");
    assert_eq!(run(&mut r), " 11 \n");
}

#[test]
fn test_integer_overflow_is_hard() {
    let mut r = Runtime::default();
    r.enter("A%=32767:A%=A%+1");
    assert_eq!(run(&mut r), "OVERFLOW\n");
}

#[test]
fn test_event_trap_runs_handler() {
    let mut r = program(&[
        r#"10 PRINT "A""#,
        r#"20 PRINT "B""#,
        "30 END",
        r#"100 PRINT "T":RETURN"#,
    ]);
    let trap = r.events().add(Some(100));
    r.events().command(trap, true, false);
    r.events().trigger(trap);
    r.enter("GOTO 10");
    assert_eq!(run(&mut r), "T\nA\nB\n");
}

#[test]
fn test_break_and_cont() {
    let mut r = program(&["10 PRINT 1", "20 GOTO 10"]);
    r.enter("RUN");
    assert_eq!(r.execute(3), Event::Print(" 1 \n".to_string()));
    r.interrupt();
    match r.execute(3) {
        Event::Errors(errors) => assert!(errors[0].is_break()),
        event => panic!("{:?}", event),
    }
    assert!(!r.is_running());
    r.enter("CONT");
    assert_eq!(r.execute(1), Event::Running);
    assert!(r.is_running());
}

#[test]
fn test_tron() {
    let mut r = program(&["10 A=1", "20 PRINT A"]);
    r.enter("TRON");
    assert_eq!(run(&mut r), "");
    r.enter("RUN");
    assert_eq!(run(&mut r), "[10][20] 1 \n");
}
