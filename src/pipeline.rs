//! # 处理链路
//!
//! 单消费者循环：从问题队列逐个取出问题，处理完并投递后才取下一个。
//! 任意时刻最多只有一次回答服务调用在进行；卡住的调用会推迟后续所有问题，
//! 这是已知限制。

use tokio::sync::mpsc;

use crate::answer::{Answer, AnswerService};
use crate::clipboard::watcher::Question;
use crate::delivery::DeliverySink;
use crate::processor::QuestionProcessor;

pub struct Pipeline<S> {
    processor: QuestionProcessor<S>,
    sink: DeliverySink,
}

impl<S: AnswerService> Pipeline<S> {
    pub fn new(processor: QuestionProcessor<S>, sink: DeliverySink) -> Self {
        Self { processor, sink }
    }

    /// 处理单个问题并投递回答。
    pub async fn process(&self, question: &Question) -> Answer {
        let answer = self.processor.handle(question).await;
        let report = self.sink.deliver(&answer);
        if !report.failures.is_empty() {
            log::debug!("投递完成，{} 个出口失败", report.failures.len());
        }
        answer
    }

    /// 消费队列直到所有发送端关闭，返回处理过的问题数。
    pub async fn run(&self, mut questions: mpsc::Receiver<Question>) -> usize {
        let mut handled = 0;
        while let Some(question) = questions.recv().await {
            self.process(&question).await;
            handled += 1;
        }
        log::info!("问题队列已关闭，处理链路结束（共处理 {} 个问题）", handled);
        handled
    }
}
