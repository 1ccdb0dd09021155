//! Prompt templates for the lesson-plan and creative-writing workflows.
//!
//! Builders only interpolate; callers validate field presence beforehand.

use crate::auth::Role;
use crate::records::models::{CreativeSubject, LessonSubject, SubjectFields};

/// Appended verbatim to lesson-plan and study-notes prompts.
pub const MATH_AND_DIAGRAM_INSTRUCTIONS: &str = r#"### Formatting Instructions
   - For any mathematical expressions, formulas, or equations, use LaTeX notation wrapped in dollar signs.
     Use $...$ for inline math (e.g., $x^2 + y^2 = z^2$) and $$...$$ for display/block math.
   - Include worked examples with step-by-step solutions using LaTeX math notation.
   - Where appropriate, include ONE simple visual diagram using Mermaid syntax in a fenced code block.
     IMPORTANT: Only use simple Mermaid flowcharts (graph TD or graph LR). Keep node labels short and plain-text.
     Do NOT use special characters, LaTeX, parentheses in labels, or quotes inside quotes.
     Example of valid Mermaid syntax:
     ```mermaid
     graph TD
         A[Start] --> B[Step 1]
         B --> C[Step 2]
         C --> D[End]
     ```
"#;

/// Appended verbatim to lesson follow-up prompts.
pub const FOLLOW_UP_FORMATTING: &str = "Ensure the response is tailored to the educational needs and culturally relevant.\n\
For any mathematical expressions or formulas, use LaTeX notation: $...$ for inline math and $$...$$ for display math. \
Where helpful, include ONE simple diagram using a Mermaid flowchart (graph TD) in a fenced code block. \
Keep Mermaid node labels short and plain-text only -- no special characters, LaTeX, or parentheses in labels.";

/// Static guidance returned alongside a fresh creative-writing story.
pub const CREATIVE_IMPROVEMENT_TIPS: &str = "Consider asking follow-up questions to clarify the direction of the story, such as:\n\
1. How can character backgrounds be enhanced?\n\
2. What additional cultural details could make the setting more vivid?\n\
3. How can the story's theme be emphasized more effectively?";

const LESSON_PLAN_SECTIONS: &str = r#"### 1. Learning Objectives
   - Define clear learning objectives, explaining how this knowledge benefits students in everyday life.
   - Emphasize practical applications in sectors like agriculture, local industries, health, and technology.

### 2. Introduction and Theory
   - Provide an accessible overview of the theoretical concepts, using relatable local examples.
   - Integrate storytelling or examples from the local context that connect theory to practice.

### 3. Practical Activities and Case Studies
   - Design engaging, hands-on activities that demonstrate real-world applications.
   - Include local case studies showing how these concepts address community challenges.
   - Highlight the work of local industries, organizations, or individuals making a positive impact.
   - Suggest collaborative group exercises or projects that encourage problem-solving and critical thinking.

### 4. Lesson Structure and Timings
   - Present the lesson structure as a table with these columns:
     Time Allocation | Activity/Phase | Description | Teaching Method | Resources Needed

### 5. Assessment and Reflection
   - Outline assessment methods that measure both theoretical understanding and practical skills.
   - Encourage students to reflect on how they could use the learned concepts in their communities.

### 6. Supplementary Resources
   - Recommend additional resources such as relevant books, articles, videos, and local sources.
   - Suggest online resources or workshops that could further enhance understanding.

### 7. Community Engagement and Follow-Up Activities
   - Provide suggestions for follow-up projects, like community engagement or field activities.
   - Encourage community experts or guest speakers to share practical insights.

"#;

const STUDY_NOTES_SECTIONS: &str = r#"### 1. Topic Overview
   - Explain the core concepts in simple, clear language with relatable local examples.

### 2. Key Concepts and Definitions
   - List and explain all key terms and definitions the student needs to know.

### 3. Detailed Explanations
   - Break down the theory step by step. Use analogies and real-life examples from Sierra Leone.

### 4. Worked Examples
   - Provide at least 3 fully worked examples with step-by-step solutions.

### 5. Practice Problems
   - Provide 5 practice problems for the student to attempt, ranging from easy to challenging.
   - Include answers at the end.

### 6. Summary and Key Takeaways
   - Summarize the most important points in bullet form.

### 7. Additional Resources
   - Suggest books, videos, or websites for further study.

"#;

/// Every prompt shape the service can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptTemplate {
    LessonPlan,
    StudyNotes,
    FollowUp,
    CreativeWriting,
    CreativeFollowUp,
}

impl PromptTemplate {
    /// Template for a brand-new record.
    pub fn initial_for(subject: &SubjectFields, role: Role) -> Self {
        match subject {
            SubjectFields::LessonPlan(_) if role.is_student() => Self::StudyNotes,
            SubjectFields::LessonPlan(_) => Self::LessonPlan,
            SubjectFields::CreativeWriting(_) => Self::CreativeWriting,
        }
    }

    /// Template for a follow-up on an existing record.
    pub fn follow_up_for(subject: &SubjectFields) -> Self {
        match subject {
            SubjectFields::LessonPlan(_) => Self::FollowUp,
            SubjectFields::CreativeWriting(_) => Self::CreativeFollowUp,
        }
    }
}

/// Prompt for the first generation of a record.
pub fn initial_prompt(subject: &SubjectFields, role: Role) -> String {
    match (PromptTemplate::initial_for(subject, role), subject) {
        (PromptTemplate::StudyNotes, SubjectFields::LessonPlan(lesson)) => study_notes(lesson),
        (_, SubjectFields::LessonPlan(lesson)) => lesson_plan(lesson),
        (_, SubjectFields::CreativeWriting(creative)) => creative_writing(creative),
    }
}

/// Prompt for a follow-up, parameterised by the record's original subject.
pub fn follow_up_prompt(subject: &SubjectFields, instruction: &str, role: Role) -> String {
    let template = PromptTemplate::follow_up_for(subject);
    log::debug!("Building {:?} prompt", template);
    match subject {
        SubjectFields::LessonPlan(lesson) => lesson_follow_up(lesson, instruction, role),
        SubjectFields::CreativeWriting(creative) => creative_follow_up(creative, instruction),
    }
}

pub fn lesson_plan(subject: &LessonSubject) -> String {
    format!(
        "Generate a detailed lesson plan on '{}' for {} {}. \
         Integrate theory with real-life, culturally relevant applications. \
         Structure the plan as follows:\n\n{}{}",
        subject.topic,
        audience(subject.level.as_deref()),
        locale(subject.area.as_deref()),
        LESSON_PLAN_SECTIONS,
        MATH_AND_DIAGRAM_INSTRUCTIONS,
    )
}

pub fn study_notes(subject: &LessonSubject) -> String {
    format!(
        "Generate detailed study notes on '{}' for {} {}. \
         The notes should help a student understand and master this topic through clear explanations and practice.\n\n{}{}",
        subject.topic,
        audience(subject.level.as_deref()),
        locale(subject.area.as_deref()),
        STUDY_NOTES_SECTIONS,
        MATH_AND_DIAGRAM_INSTRUCTIONS,
    )
}

pub fn lesson_follow_up(subject: &LessonSubject, instruction: &str, role: Role) -> String {
    let level = subject.level.as_deref().unwrap_or("their");
    let role_instruction = if role.is_student() {
        format!(
            "You are helping a student study the topic '{}' at {} level {}. \
             Provide additional study material, examples, and explanations as follows:\n",
            subject.topic,
            level,
            locale(subject.area.as_deref()),
        )
    } else {
        format!(
            "Based on the lesson topic '{}' for {} {}, \
             provide additional teaching insights, strategies, and classroom activities as follows:\n",
            subject.topic,
            audience(subject.level.as_deref()),
            locale(subject.area.as_deref()),
        )
    };

    format!("{}{}\n{}", role_instruction, instruction.trim(), FOLLOW_UP_FORMATTING)
}

pub fn creative_writing(subject: &CreativeSubject) -> String {
    format!(
        "Write a captivating story titled '{title}' in the '{genre}' genre with a '{tone}' tone for '{level}' level readers in Sierra Leone, set in {location}. \
         Ensure the story highlights aspects of '{theme}' and has a relatable plot '{plot}' built around the idea '{idea}' while staying culturally relevant to Sierra Leone. \
         Structure the story as follows:\n\n\
         1. **Title:** Start with a compelling title reflecting the theme '{theme}'.\n\n\
         2. **Opening Paragraph:** Begin with an engaging sentence that sets the mood.\n\n\
         3. **Body Paragraphs:** Develop the story across three paragraphs. Include descriptions \
         of Sierra Leonean culture, landscapes, and experiences, making it feel authentic and local.\n\n\
         4. **Conclusion:** Conclude with a message of resilience or joy, as fits the '{tone}'.\n\n\
         5. **Character Tips:** Add characters that readers can relate to, using easy, memorable descriptions.\n\n\
         6. **Setting & Imagery:** Paint a vivid image of the setting that draws readers in.\n\n\
         7. **Story Length:** Keep it within 500-900 words.\n\n\
         8. **Writing Tips:** Add simple pointers to help writers improve their story structure, \
         like focusing on plot progression and character development.\n\n",
        title = subject.title,
        genre = subject.genre,
        tone = subject.tone,
        level = subject.level,
        location = subject.location,
        theme = subject.theme,
        plot = subject.plot,
        idea = subject.idea,
    )
}

pub fn creative_follow_up(subject: &CreativeSubject, instruction: &str) -> String {
    format!(
        "Based on a '{}' story for '{}' readers in Sierra Leone, following the theme '{}' \
         and plot '{}', provide enhancements based on this feedback: {}. \
         Keep the content culturally resonant and user-friendly.",
        subject.genre,
        subject.level,
        subject.theme,
        subject.plot,
        instruction.trim(),
    )
}

fn audience(level: Option<&str>) -> String {
    match level {
        Some(level) => format!("{level} students"),
        None => "students".to_string(),
    }
}

fn locale(area: Option<&str>) -> String {
    match area {
        Some(area) => format!("in {area}, Sierra Leone"),
        None => "in Sierra Leone".to_string(),
    }
}
