use common::database::{Database, DatabaseConfig};
use common::llm::ScriptedModel;
use common::pipeline::{Pipeline, PipelineContext, PipelineState, PipelineStep};
use std::sync::Arc;

const HR_FIXTURE: &str = "
CREATE TABLE departments (
    dept_id INTEGER PRIMARY KEY,
    dept_name TEXT
);
INSERT INTO departments (dept_id, dept_name) VALUES (1, 'HR'), (2, 'Engineering'), (3, 'Sales');

CREATE TABLE employees (
    id INTEGER PRIMARY KEY,
    name TEXT,
    dept_id INTEGER,
    salary INTEGER,
    FOREIGN KEY (dept_id) REFERENCES departments(dept_id)
);
INSERT INTO employees (name, dept_id, salary) VALUES
    ('Alice', 1, 60000), ('Bob', 2, 85000), ('Charlie', 3, 50000), ('David', 2, 90000);

CREATE TABLE reviews (
    review_id INTEGER PRIMARY KEY,
    employee_id INTEGER,
    review_date TEXT,
    rating INTEGER,
    FOREIGN KEY (employee_id) REFERENCES employees(id)
);
INSERT INTO reviews (employee_id, review_date, rating) VALUES
    (1, '2024-01-10', 4), (2, '2024-03-15', 5), (3, '2024-05-20', 3), (4, '2024-04-12', 4);

CREATE TABLE attendance (
    id INTEGER PRIMARY KEY,
    employee_id INTEGER,
    attendance_date TEXT,
    status TEXT,
    FOREIGN KEY (employee_id) REFERENCES employees(id)
);
INSERT INTO attendance (employee_id, attendance_date, status) VALUES
    (1, '2024-06-01', 'Present'), (2, '2024-06-01', 'Absent'),
    (3, '2024-06-01', 'Present'), (4, '2024-06-01', 'Absent');

CREATE TABLE projects (
    project_id INTEGER PRIMARY KEY,
    project_name TEXT,
    dept_id INTEGER,
    start_date TEXT,
    end_date TEXT,
    FOREIGN KEY (dept_id) REFERENCES departments(dept_id)
);
INSERT INTO projects (project_name, dept_id, start_date, end_date) VALUES
    ('Payroll Automation', 1, '2024-01-01', '2024-03-30'),
    ('AI Chatbot', 2, '2024-02-15', '2024-06-30'),
    ('CRM Upgrade', 3, '2024-03-01', '2024-05-15');

CREATE TABLE employee_projects (
    emp_id INTEGER,
    project_id INTEGER,
    PRIMARY KEY (emp_id, project_id),
    FOREIGN KEY (emp_id) REFERENCES employees(id),
    FOREIGN KEY (project_id) REFERENCES projects(project_id)
);
INSERT INTO employee_projects (emp_id, project_id) VALUES (1, 1), (2, 2), (4, 2), (3, 3);
";

fn hr_database() -> Database {
    let database = Database::open_in_memory(DatabaseConfig::default()).unwrap();
    database.execute_batch(HR_FIXTURE).unwrap();
    database
}

fn pipeline_with(model: &Arc<ScriptedModel>) -> Pipeline {
    Pipeline::new(PipelineContext::new(model.clone(), hr_database()))
}

#[tokio::test]
async fn counts_departments() {
    let model = Arc::new(ScriptedModel::new([
        "SELECT COUNT(*) FROM departments;",
        "There are 3 departments.",
    ]));

    let (state, _) = pipeline_with(&model)
        .execute(PipelineState::new("How many departments are there?"))
        .await
        .unwrap();

    assert_eq!(state.step, PipelineStep::Summarized);
    assert_eq!(state.sql().unwrap(), "SELECT COUNT(*) FROM departments;");
    assert_eq!(state.query_result().unwrap().to_text(), "(3,)");
    assert_eq!(state.summary().unwrap(), "There are 3 departments.");

    let prompts = model.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].contains("CREATE TABLE departments"));
    assert!(prompts[0].contains("CREATE TABLE employee_projects"));
    assert!(prompts[0].contains("How many departments are there?"));
    assert!(prompts[1].contains("Query Result:\n(3,)"));
}

#[tokio::test]
async fn execution_error_short_circuits_summary() {
    let model = Arc::new(ScriptedModel::new([
        "```sql\nSELECT foo FROM employees;\n```",
    ]));

    let output = pipeline_with(&model)
        .run("What is every employee's foo?")
        .await
        .unwrap();

    assert_eq!(output.sql, "SELECT foo FROM employees;");
    assert!(output
        .answer
        .starts_with("There was an error executing the SQL query: Error: "));
    assert!(output.answer.contains("no such column: foo"));
    assert_eq!(model.call_count(), 1);
}

#[tokio::test]
async fn unterminated_output_is_executed_as_is() {
    let model = Arc::new(ScriptedModel::new([
        "  SELECT name FROM employees WHERE salary > 80000 ORDER BY name  ",
        "Bob and David earn more than 80,000.",
    ]));

    let (state, _) = pipeline_with(&model)
        .execute(PipelineState::new("Who earns more than 80000?"))
        .await
        .unwrap();

    assert_eq!(
        state.sql().unwrap(),
        "SELECT name FROM employees WHERE salary > 80000 ORDER BY name;"
    );
    assert_eq!(
        state.query_result().unwrap().to_text(),
        "('Bob',)\n('David',)"
    );
    assert_eq!(state.summary().unwrap(), "Bob and David earn more than 80,000.");
}

#[tokio::test]
async fn join_results_are_rendered_per_row() {
    let model = Arc::new(ScriptedModel::new([
        "Here is the query:\n```sql\nSELECT p.project_name, COUNT(ep.emp_id)\nFROM projects p\nJOIN employee_projects ep ON ep.project_id = p.project_id\nGROUP BY p.project_id\nORDER BY p.project_id;\n```",
        "Payroll Automation has 1 person, AI Chatbot 2 and CRM Upgrade 1.",
    ]));

    let (state, _) = pipeline_with(&model)
        .execute(PipelineState::new("How many people work on each project?"))
        .await
        .unwrap();

    assert_eq!(
        state.query_result().unwrap().to_text(),
        "('Payroll Automation', 1)\n('AI Chatbot', 2)\n('CRM Upgrade', 1)"
    );
}

#[tokio::test]
async fn identical_inputs_give_identical_outputs() {
    let replies = ["SELECT dept_name FROM departments ORDER BY dept_id;", "HR, Engineering and Sales."];

    let first_model = Arc::new(ScriptedModel::new(replies));
    let second_model = Arc::new(ScriptedModel::new(replies));

    let first = pipeline_with(&first_model).run("List the departments").await.unwrap();
    let second = pipeline_with(&second_model).run("List the departments").await.unwrap();

    assert_eq!(first.sql, second.sql);
    assert_eq!(first.answer, second.answer);
    assert_eq!(first_model.prompts(), second_model.prompts());
}

#[tokio::test]
async fn pipelines_share_one_database() {
    let database = hr_database();
    let model = Arc::new(ScriptedModel::new([
        "SELECT COUNT(*) FROM attendance WHERE status = 'Absent';",
        "Two employees were absent.",
        "SELECT COUNT(*) FROM reviews WHERE rating >= 4;",
        "Three reviews scored 4 or more.",
    ]));

    let pipeline = Pipeline::new(PipelineContext::new(model.clone(), database));

    let absent = pipeline.run("How many were absent?").await.unwrap();
    let reviews = pipeline.run("How many good reviews?").await.unwrap();

    assert_eq!(absent.answer, "Two employees were absent.");
    assert_eq!(reviews.answer, "Three reviews scored 4 or more.");
    assert_eq!(model.call_count(), 4);
}

#[tokio::test]
async fn empty_model_output_runs_as_no_op() {
    let model = Arc::new(ScriptedModel::new([""]));
    model.push_reply("I could not produce a query for that question.");

    let (state, _) = pipeline_with(&model)
        .execute(PipelineState::new("What is the meaning of life?"))
        .await
        .unwrap();

    assert_eq!(state.sql().unwrap(), ";");
    assert!(!state.query_result().unwrap().is_failure());
    assert_eq!(state.query_result().unwrap().to_text(), "");
    assert_eq!(
        state.summary().unwrap(),
        "I could not produce a query for that question."
    );
    assert_eq!(model.call_count(), 2);
}

#[tokio::test]
async fn fenced_block_with_two_statements_is_rejected() {
    let model = Arc::new(ScriptedModel::new([
        "```sql\nSELECT COUNT(*) FROM departments;\nSELECT COUNT(*) FROM employees\n```",
    ]));

    let output = pipeline_with(&model).run("How big is the company?").await.unwrap();

    assert_eq!(
        output.answer,
        "There was an error executing the SQL query: Error: You can only execute one statement at a time."
    );
    assert_eq!(model.call_count(), 1);
}
