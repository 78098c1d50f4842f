mod common;
use basic::mach::{Event, Runtime};
use common::*;

#[test]
fn test_if_then_else() {
    let mut r = Runtime::default();
    r.enter(r#"IF 1 THEN PRINT "A" ELSE PRINT "B""#);
    assert_eq!(exec(&mut r), "A\n");
    r.enter(r#"IF 0 THEN PRINT "A" ELSE PRINT "B""#);
    assert_eq!(exec(&mut r), "B\n");
    r.enter(r#"IF 0 THEN PRINT "A":PRINT "C""#);
    assert_eq!(exec(&mut r), "");
}

#[test]
fn test_if_jumps() {
    let mut r = Runtime::default();
    program(
        &mut r,
        &[
            "10 IF A=0 THEN 40 ELSE 30",
            r#"30 PRINT "THIRTY":END"#,
            r#"40 PRINT "FORTY":A=1:GOTO 10"#,
        ],
    );
    r.enter("RUN");
    assert_eq!(exec(&mut r), "FORTY\nTHIRTY\n");
}

#[test]
fn test_nested_if_else() {
    let mut r = Runtime::default();
    r.enter(r#"IF 0 THEN IF 1 THEN PRINT "A" ELSE PRINT "B" ELSE PRINT "C""#);
    assert_eq!(exec(&mut r), "C\n");
}

#[test]
fn test_gosub_return() {
    let mut r = Runtime::default();
    program(
        &mut r,
        &[
            r#"10 GOSUB 100:PRINT "BACK""#,
            "20 END",
            r#"100 PRINT "SUB""#,
            "110 RETURN",
        ],
    );
    r.enter("RUN");
    assert_eq!(exec(&mut r), "SUB\nBACK\n");
    r.enter("RETURN");
    assert_eq!(exec(&mut r), "RETURN WITHOUT GOSUB\n");
}

#[test]
fn test_on_goto_and_gosub() {
    let mut r = Runtime::default();
    program(
        &mut r,
        &[
            "10 FOR I=1 TO 3",
            "20 ON I GOTO 40,50,60",
            r#"40 PRINT "A";:GOTO 70"#,
            r#"50 PRINT "B";:GOTO 70"#,
            r#"60 PRINT "C";"#,
            "70 NEXT",
        ],
    );
    r.enter("RUN");
    assert_eq!(exec(&mut r), "ABC");
    r.enter(r#"ON 5 GOSUB 100:PRINT "X""#);
    assert_eq!(exec(&mut r), "X\n");
    r.enter("ON 300 GOTO 10");
    assert_eq!(exec(&mut r), "ILLEGAL FUNCTION CALL\n");
}

#[test]
fn test_while_wend() {
    let mut r = Runtime::default();
    program(
        &mut r,
        &[
            "10 I=0",
            "20 WHILE I<3",
            "30 I=I+1:PRINT I;",
            "40 WEND",
            r#"50 PRINT "END""#,
        ],
    );
    r.enter("RUN");
    assert_eq!(exec(&mut r), " 1  2  3 END\n");
}

#[test]
fn test_nested_while() {
    let mut r = Runtime::default();
    r.enter("I=0:WHILE I<2:I=I+1:J=0:WHILE J<2:J=J+1:PRINT I*10+J;:WEND:WEND");
    assert_eq!(exec(&mut r), " 11  12  21  22 ");
}

#[test]
fn test_while_errors() {
    let mut r = Runtime::default();
    r.enter("WEND");
    assert_eq!(exec(&mut r), "WEND WITHOUT WHILE\n");
    program(&mut r, &["10 WHILE 1", "20 PRINT"]);
    r.enter("RUN");
    assert_eq!(exec(&mut r), "WHILE WITHOUT WEND IN 10\n");
}

#[test]
fn test_read_data_restore() {
    let mut r = Runtime::default();
    program(
        &mut r,
        &[
            r#"10 DATA 1,"A,B", 3"#,
            "20 READ X,A$,Y",
            "30 PRINT X;A$;Y",
            "40 RESTORE",
            "50 READ Z:PRINT Z",
            "60 READ Q$,Q$,Q$",
        ],
    );
    r.enter("RUN");
    assert_eq!(exec(&mut r), " 1 A,B 3 \n 1 \nOUT OF DATA IN 60\n");
}

#[test]
fn test_restore_line() {
    let mut r = Runtime::default();
    program(
        &mut r,
        &[
            "10 DATA 1,2",
            "20 DATA 3,4",
            "30 RESTORE 20:READ A:PRINT A",
        ],
    );
    r.enter("RUN");
    assert_eq!(exec(&mut r), " 3 \n");
    r.enter("RESTORE 25");
    assert_eq!(exec(&mut r), "UNDEFINED LINE NUMBER\n");
}

#[test]
fn test_bad_data_reports_data_line() {
    let mut r = Runtime::default();
    program(&mut r, &["10 DATA ABC", "20 READ X"]);
    r.enter("RUN");
    assert_eq!(exec(&mut r), "SYNTAX ERROR IN 10\n");
}

#[test]
fn test_arrays() {
    let mut r = Runtime::default();
    r.enter("DIM A(3):A(2)=5:PRINT A(2);A(3)");
    assert_eq!(exec(&mut r), " 5  0 \n");
    r.enter("DIM B(2):B(3)=1");
    assert_eq!(exec(&mut r), "SUBSCRIPT OUT OF RANGE\n");
    r.enter("C(10)=7:PRINT C(10)");
    assert_eq!(exec(&mut r), " 7 \n");
    r.enter("ERASE C:DIM C(1):PRINT C(1)");
    assert_eq!(exec(&mut r), " 0 \n");
}

#[test]
fn test_swap() {
    let mut r = Runtime::default();
    r.enter("A=1:B=2:SWAP A,B:PRINT A;B");
    assert_eq!(exec(&mut r), " 2  1 \n");
    r.enter(r#"A=1:B$="X":SWAP A,B$"#);
    assert_eq!(exec(&mut r), "TYPE MISMATCH\n");
}

#[test]
fn test_deftype() {
    let mut r = Runtime::default();
    r.enter("DEFINT A-Z:A=2.6:PRINT A");
    assert_eq!(exec(&mut r), " 3 \n");
    r.enter(r#"DEFSTR S:S="HI":PRINT S"#);
    assert_eq!(exec(&mut r), "HI\n");
}

#[test]
fn test_stop_and_cont() {
    let mut r = Runtime::default();
    program(&mut r, &[r#"10 PRINT "A""#, "20 STOP", r#"30 PRINT "B""#]);
    r.enter("RUN");
    assert_eq!(exec(&mut r), "A\nBREAK IN 20\n");
    r.enter("CONT");
    assert_eq!(exec(&mut r), "B\n");
    r.enter("40 END");
    r.enter("CONT");
    assert_eq!(exec(&mut r), "CAN'T CONTINUE\n");
}

#[test]
fn test_end_closes_program() {
    let mut r = Runtime::default();
    program(&mut r, &[r#"10 PRINT "A":END:PRINT "B""#]);
    r.enter("RUN");
    assert_eq!(exec(&mut r), "A\n");
}

#[test]
fn test_print_separators() {
    let mut r = Runtime::default();
    r.enter("PRINT 1,2");
    assert_eq!(exec(&mut r), format!("{:<14}{}", " 1 ", " 2 \n"));
    r.enter(r#"PRINT "A";TAB(5);"B";SPC(2);"C""#);
    assert_eq!(exec(&mut r), "A   B  C\n");
    r.enter(r#"PRINT "A";:PRINT "B""#);
    assert_eq!(exec(&mut r), "AB\n");
    r.enter(r#"?"X""#);
    assert_eq!(exec(&mut r), "X\n");
}

#[test]
fn test_write() {
    let mut r = Runtime::default();
    r.enter(r#"WRITE 1,"A",-2.5"#);
    assert_eq!(exec(&mut r), "1,\"A\",-2.5\n");
}

#[test]
fn test_clear_and_new() {
    let mut r = Runtime::default();
    program(&mut r, &["10 PRINT A"]);
    r.enter("A=5:CLEAR:PRINT A");
    assert_eq!(exec(&mut r), " 0 \n");
    r.enter("NEW");
    assert_eq!(exec(&mut r), "");
    r.enter("LIST");
    assert_eq!(exec(&mut r), "");
}

#[test]
fn test_random_numbers() {
    let mut r = Runtime::default();
    r.enter("RANDOMIZE 5:A=RND:RANDOMIZE 5:B=RND:PRINT A=B;RND(0)=B;A<1;A>=0");
    assert_eq!(exec(&mut r), "-1 -1 -1 -1 \n");
}

#[test]
fn test_unknown_statement() {
    let mut r = Runtime::default();
    r.enter("CLS");
    assert_eq!(exec(&mut r), "SYNTAX ERROR\n");
    program(&mut r, &["10 A=", "20 PRINT (1"]);
    r.enter("RUN");
    assert_eq!(exec(&mut r), "MISSING OPERAND IN 10\n");
    r.enter("GOTO 20");
    assert_eq!(exec(&mut r), "SYNTAX ERROR IN 20\n");
}

#[test]
fn test_reset() {
    let mut r = Runtime::default();
    program(
        &mut r,
        &["10 GOSUB 100", "20 END", "100 FOR I=1 TO 30000", "110 NEXT I"],
    );
    r.enter("RUN");
    assert_eq!(r.execute(50), Event::Running);
    assert!(r.is_running());
    r.reset();
    assert!(!r.is_running());
    assert_eq!(r.execute(50), Event::Stopped);
    r.enter("RETURN");
    assert_eq!(exec(&mut r), "RETURN WITHOUT GOSUB\n");
    r.enter("NEXT I");
    assert_eq!(exec(&mut r), "NEXT WITHOUT FOR\n");
    r.enter("CONT");
    assert_eq!(exec(&mut r), "CAN'T CONTINUE\n");
}
